#![forbid(unsafe_code)]

//! Dock container: children carve strips off the container's edges.
//!
//! Each child's edge comes from the side-table (default `Left`),
//! consumed in child order. Measure offers every docked child the full
//! available size and accumulates the docked axis; only arrange shrinks
//! the frame progressively. With `last_child_fill` (the default) the
//! last child skips the edge walk and takes whatever frame remains.

use kui_core::{Rect, Size};

use crate::context::LayoutContext;
use crate::node::{DockEdge, NodeId};
use crate::tree::LayoutTree;

pub(crate) fn measure(
    tree: &mut LayoutTree,
    ctx: &mut LayoutContext,
    id: NodeId,
    available: Size,
) -> Size {
    let fill = tree.dock_fill(id);
    let children = tree.visible_child_ids(id);
    let last = children.len().checked_sub(1);

    // Running accumulation along each docked axis, plus the envelope of
    // accumulated-so-far + child on the cross axis so undocked extents
    // are not lost.
    let mut acc_w = 0.0f32;
    let mut acc_h = 0.0f32;
    let mut env_w = 0.0f32;
    let mut env_h = 0.0f32;

    for (i, &child) in children.iter().enumerate() {
        if fill && Some(i) == last {
            let remaining = Size::new(
                (available.width - acc_w).max(0.0),
                (available.height - acc_h).max(0.0),
            );
            let desired = tree.measure(ctx, child, remaining);
            env_w = env_w.max(acc_w + desired.width);
            env_h = env_h.max(acc_h + desired.height);
        } else {
            let desired = tree.measure(ctx, child, available);
            match tree.dock_edge(id, child) {
                DockEdge::Left | DockEdge::Right => {
                    env_h = env_h.max(acc_h + desired.height);
                    acc_w += desired.width;
                }
                DockEdge::Top | DockEdge::Bottom => {
                    env_w = env_w.max(acc_w + desired.width);
                    acc_h += desired.height;
                }
            }
        }
    }

    Size::new(env_w.max(acc_w), env_h.max(acc_h))
}

pub(crate) fn arrange(tree: &mut LayoutTree, ctx: &mut LayoutContext, id: NodeId, inner: Rect) {
    let fill = tree.dock_fill(id);
    let children = tree.visible_child_ids(id);
    let last = children.len().checked_sub(1);

    // Shrinking frame; strips never invert it.
    let mut left = inner.x;
    let mut top = inner.y;
    let mut right = inner.right();
    let mut bottom = inner.bottom();

    for (i, &child) in children.iter().enumerate() {
        let frame_w = (right - left).max(0.0);
        let frame_h = (bottom - top).max(0.0);

        let slot = if fill && Some(i) == last {
            Rect::new(left, top, frame_w, frame_h)
        } else {
            let desired = tree.node(child).desired_size();
            match tree.dock_edge(id, child) {
                DockEdge::Left => {
                    let width = desired.width.min(frame_w);
                    let slot = Rect::new(left, top, width, frame_h);
                    left += width;
                    slot
                }
                DockEdge::Right => {
                    let width = desired.width.min(frame_w);
                    let slot = Rect::new(right - width, top, width, frame_h);
                    right -= width;
                    slot
                }
                DockEdge::Top => {
                    let height = desired.height.min(frame_h);
                    let slot = Rect::new(left, top, frame_w, height);
                    top += height;
                    slot
                }
                DockEdge::Bottom => {
                    let height = desired.height.min(frame_h);
                    let slot = Rect::new(left, bottom - height, frame_w, height);
                    bottom -= height;
                    slot
                }
            }
        };
        tree.arrange(ctx, child, slot);
    }
}
