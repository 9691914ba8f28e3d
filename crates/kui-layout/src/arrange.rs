#![forbid(unsafe_code)]

//! The arrange pass and the arrangement finalizer.
//!
//! Arrange descends the tree with decisions already made: a parent hands
//! each child an absolute slot rectangle, the finalizer resolves margin
//! and per-axis alignment within it, and the node's kind then places its
//! own children inside the padding box of the resulting render rect.
//!
//! Mirroring measure, a clean node offered the same slot bit-for-bit is
//! skipped without touching its subtree. When a node's render rect
//! changes, the union of the old and new rects is pushed onto the pass
//! context's damage list for the rendering collaborator.

use kui_core::{Rect, sanitize_extent};
use tracing::trace;

use crate::context::LayoutContext;
use crate::measure::{clamp_axis, sanitized_limits};
use crate::node::{DirtyFlags, KindTag, NodeId};
use crate::tree::LayoutTree;
use crate::{Alignment, canvas, dock, grid, stack, wrap};

/// Resolve one axis of the finalizer: how large the node is within the
/// `extent` its parent granted (margin already removed), and where it
/// sits.
///
/// `Stretch` fills the extent; the other alignments use the
/// margin-exclusive desired size, never more than the extent. An explicit
/// size re-asserts itself over both, then the min/max box applies. A
/// stretched axis that ends up capped below the extent has no edge to
/// hug, so it centers in the leftover space.
fn resolve_axis(
    extent: f32,
    desired: f32,
    align: Alignment,
    explicit: Option<f32>,
    min: f32,
    max: f32,
) -> (f32, f32) {
    let mut size = match align {
        Alignment::Stretch => extent,
        _ => desired.min(extent),
    };
    if let Some(value) = explicit {
        size = value;
    }
    size = clamp_axis(size, min, max).min(extent);

    let leftover = (extent - size).max(0.0);
    let offset = match align {
        Alignment::Start => 0.0,
        Alignment::Center | Alignment::Stretch => leftover / 2.0,
        Alignment::End => leftover,
    };
    (offset, size)
}

impl LayoutTree {
    /// Arrange `id` into `slot`, an absolute rectangle in the parent's
    /// coordinate space.
    ///
    /// Subtracts margin, resolves alignment, stores the result as the
    /// node's render rect, then recurses into children with their
    /// allotted rectangles. If the node is clean and `slot` equals the
    /// previously offered slot bit-for-bit, the subtree is skipped.
    ///
    /// Side effects: clears `ARRANGE`, records the repaint region when
    /// the render rect changed.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn arrange(&mut self, ctx: &mut LayoutContext, id: NodeId, slot: Rect) {
        self.arrange_in_slot(ctx, id, slot, None, None);
    }

    /// Arrange with optional per-axis alignment overrides.
    ///
    /// Stack placement forces the cross axis to `Stretch` through this
    /// entry point; everyone else goes through [`LayoutTree::arrange`].
    pub(crate) fn arrange_in_slot(
        &mut self,
        ctx: &mut LayoutContext,
        id: NodeId,
        slot: Rect,
        halign_override: Option<Alignment>,
        valign_override: Option<Alignment>,
    ) {
        ctx.stats.arrange_calls += 1;
        let slot = slot.sanitized();

        let node = self.node(id);
        if !node.dirty.contains(DirtyFlags::ARRANGE) && node.last_slot == Some(slot) {
            ctx.stats.arrange_skips += 1;
            return;
        }

        if !node.visible {
            // Collapse to a zero-size rect at the slot origin; the old
            // footprint still needs a repaint.
            let node = self.node_mut(id);
            let old = node.render_rect;
            node.render_rect = Rect::new(slot.x, slot.y, 0.0, 0.0);
            node.last_slot = Some(slot);
            node.dirty.remove(DirtyFlags::ARRANGE);
            if old != node.render_rect {
                let region = old.union(&node.render_rect);
                ctx.push_damage(region);
            }
            return;
        }

        let ((min_w, max_w), (min_h, max_h)) = sanitized_limits(self, id);
        let node = self.node(id);
        let margin = node.margin.sanitized();
        let content = slot.inner(margin);
        let desired_inner = node.desired.deflate(margin);
        let halign = halign_override.unwrap_or(node.halign);
        let valign = valign_override.unwrap_or(node.valign);
        let explicit_w = node.width.map(sanitize_extent);
        let explicit_h = node.height.map(sanitize_extent);

        let (dx, width) = resolve_axis(
            content.width,
            desired_inner.width,
            halign,
            explicit_w,
            min_w,
            max_w,
        );
        let (dy, height) = resolve_axis(
            content.height,
            desired_inner.height,
            valign,
            explicit_h,
            min_h,
            max_h,
        );
        let rect = Rect::new(content.x + dx, content.y + dy, width, height).sanitized();

        let old = {
            let node = self.node_mut(id);
            let old = node.render_rect;
            node.render_rect = rect;
            node.last_slot = Some(slot);
            node.slot_overrides = (halign_override, valign_override);
            old
        };

        let tag = self.node(id).kind.tag();
        if tag != KindTag::Leaf {
            let padding = self.node(id).padding.sanitized();
            let inner = rect.inner(padding);
            match tag {
                KindTag::Stack => stack::arrange(self, ctx, id, inner),
                KindTag::Grid => grid::arrange(self, ctx, id, inner),
                KindTag::Dock => dock::arrange(self, ctx, id, inner),
                KindTag::Wrap => wrap::arrange(self, ctx, id, inner),
                KindTag::Canvas => canvas::arrange(self, ctx, id, inner),
                KindTag::Leaf => {}
            }
        }

        self.node_mut(id).dirty.remove(DirtyFlags::ARRANGE);
        if old != rect {
            trace!(target: "kui_layout", %id, ?old, ?rect, "render rect changed");
            ctx.push_damage(old.union(&rect));
        }
    }
}
