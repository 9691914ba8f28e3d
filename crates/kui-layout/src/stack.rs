#![forbid(unsafe_code)]

//! Stack container: linear layout along one axis.
//!
//! Children are offered unconstrained space along the stacking axis and
//! the panel's available extent across it, then placed at their running
//! offset with uniform spacing between consecutive visible children.
//! The cross axis always stretches to the panel's final cross extent;
//! a stack does not honor per-child cross alignment.

use kui_core::{Rect, Size};

use crate::context::LayoutContext;
use crate::node::NodeId;
use crate::tree::LayoutTree;
use crate::{Alignment, Orientation};

pub(crate) fn measure(
    tree: &mut LayoutTree,
    ctx: &mut LayoutContext,
    id: NodeId,
    available: Size,
) -> Size {
    let (orientation, spacing) = tree.stack_spec(id);
    let child_available = orientation.pack(f32::INFINITY, orientation.cross_of(available));

    let mut main = 0.0f32;
    let mut cross = 0.0f32;
    let mut count = 0usize;
    for child in tree.visible_child_ids(id) {
        let desired = tree.measure(ctx, child, child_available);
        main += orientation.main_of(desired);
        cross = cross.max(orientation.cross_of(desired));
        count += 1;
    }
    if count > 1 {
        main += spacing * (count - 1) as f32;
    }
    orientation.pack(main, cross)
}

pub(crate) fn arrange(tree: &mut LayoutTree, ctx: &mut LayoutContext, id: NodeId, inner: Rect) {
    let (orientation, spacing) = tree.stack_spec(id);
    let cross_extent = orientation.cross_of(inner.size());

    let mut offset = 0.0f32;
    for child in tree.visible_child_ids(id) {
        let extent = orientation.main_of(tree.node(child).desired_size());
        let slot = match orientation {
            Orientation::Horizontal => Rect::new(inner.x + offset, inner.y, extent, cross_extent),
            Orientation::Vertical => Rect::new(inner.x, inner.y + offset, cross_extent, extent),
        };
        // Cross axis stretches regardless of the child's own alignment.
        let (halign, valign) = match orientation {
            Orientation::Horizontal => (None, Some(Alignment::Stretch)),
            Orientation::Vertical => (Some(Alignment::Stretch), None),
        };
        tree.arrange_in_slot(ctx, child, slot, halign, valign);
        offset += extent + spacing;
    }
}
