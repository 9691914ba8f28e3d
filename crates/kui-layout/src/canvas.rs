#![forbid(unsafe_code)]

//! Canvas container: absolute positioning from per-child anchors.
//!
//! Children have no sizing relationship with the canvas or each other:
//! each is measured unconstrained and placed at its side-table
//! `left`/`top` offsets (default 0). A `right`/`bottom` anchor takes
//! precedence on its axis, offsetting from the canvas's far edge using
//! the canvas's final size. The canvas neither clips nor wraps; its own
//! desired size is the bounding box of `left + width` / `top + height`
//! over all children.

use kui_core::{Rect, Size, sanitize_coord};

use crate::context::LayoutContext;
use crate::node::NodeId;
use crate::tree::LayoutTree;

pub(crate) fn measure(
    tree: &mut LayoutTree,
    ctx: &mut LayoutContext,
    id: NodeId,
    _available: Size,
) -> Size {
    let children = tree.visible_child_ids(id);

    let mut width = 0.0f32;
    let mut height = 0.0f32;
    for &child in &children {
        let desired = tree.measure(ctx, child, Size::INFINITE);
        let anchors = tree.canvas_anchors(id, child);
        let left = sanitize_coord(anchors.left.unwrap_or(0.0));
        let top = sanitize_coord(anchors.top.unwrap_or(0.0));
        width = width.max(left + desired.width);
        height = height.max(top + desired.height);
    }
    Size::new(width.max(0.0), height.max(0.0))
}

pub(crate) fn arrange(tree: &mut LayoutTree, ctx: &mut LayoutContext, id: NodeId, inner: Rect) {
    for child in tree.visible_child_ids(id) {
        let desired = tree.node(child).desired_size();
        let anchors = tree.canvas_anchors(id, child);

        let x = match anchors.right {
            Some(right) => inner.right() - sanitize_coord(right) - desired.width,
            None => inner.x + sanitize_coord(anchors.left.unwrap_or(0.0)),
        };
        let y = match anchors.bottom {
            Some(bottom) => inner.bottom() - sanitize_coord(bottom) - desired.height,
            None => inner.y + sanitize_coord(anchors.top.unwrap_or(0.0)),
        };

        tree.arrange(ctx, child, Rect::new(x, y, desired.width, desired.height));
    }
}
