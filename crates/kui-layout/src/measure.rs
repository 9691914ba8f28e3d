#![forbid(unsafe_code)]

//! The measure pass.
//!
//! Measure is a depth-first descent: a parent offers each child an
//! available [`Size`] (`+∞` on an axis means "unconstrained") and the
//! child replies with its desired size, computed bottom-up. Results are
//! memoized per node against the offered size, so re-measuring an
//! unchanged subtree is a cache hit, not a recomputation.
//!
//! Degenerate inputs (`NaN`, negative extents) clamp to zero here rather
//! than propagate; one malformed node must not corrupt the whole pass.

use kui_core::{Size, sanitize_extent};
use tracing::trace;

use crate::context::LayoutContext;
use crate::node::{DirtyFlags, Kind, KindTag, NodeId};
use crate::tree::LayoutTree;
use crate::{canvas, dock, grid, stack, wrap};

/// Clamp `value` into `[lo, hi]` without `f32::clamp`'s panics on
/// inverted bounds; `hi` is raised to `lo` first so min wins.
#[inline]
pub(crate) fn clamp_axis(value: f32, lo: f32, hi: f32) -> f32 {
    value.max(lo).min(hi.max(lo))
}

/// A node's sanitized min/max box: `((min_w, max_w), (min_h, max_h))`.
pub(crate) fn sanitized_limits(tree: &LayoutTree, id: NodeId) -> ((f32, f32), (f32, f32)) {
    let node = tree.node(id);
    let min_w = sanitize_extent(node.min_width);
    let min_h = sanitize_extent(node.min_height);
    // A NaN maximum reads as "no maximum", not zero.
    let max_w = if node.max_width.is_nan() {
        f32::INFINITY
    } else {
        node.max_width.max(min_w)
    };
    let max_h = if node.max_height.is_nan() {
        f32::INFINITY
    } else {
        node.max_height.max(min_h)
    };
    ((min_w, max_w), (min_h, max_h))
}

impl LayoutTree {
    /// Measure `id` against `available`, returning its margin-inclusive
    /// desired size.
    ///
    /// If the node is clean and `available` equals the previously offered
    /// size bit-for-bit, the cached result is returned without touching
    /// the subtree. Otherwise the node's kind computes a core size from
    /// the min/max-clamped available space; an explicit width/height then
    /// overrides the corresponding dimension, the result is re-clamped to
    /// the min/max box, margin is added, and the total is capped at the
    /// originally offered size - a node never reports more than it was
    /// offered.
    ///
    /// Side effects: clears `MEASURE`, sets `ARRANGE`, records the
    /// memoization key.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn measure(&mut self, ctx: &mut LayoutContext, id: NodeId, available: Size) -> Size {
        ctx.stats.measure_calls += 1;
        let available = available.sanitized();

        {
            let node = self.node(id);
            if !node.dirty.contains(DirtyFlags::MEASURE) && node.last_available == Some(available)
            {
                ctx.stats.measure_cache_hits += 1;
                return node.desired;
            }
            if !node.visible {
                let node = self.node_mut(id);
                node.desired = Size::ZERO;
                node.last_available = Some(available);
                node.dirty.remove(DirtyFlags::MEASURE);
                node.dirty.insert(DirtyFlags::ARRANGE);
                return Size::ZERO;
            }
        }

        let ((min_w, max_w), (min_h, max_h)) = sanitized_limits(self, id);
        let constrained = Size::new(
            clamp_axis(available.width, min_w, max_w),
            clamp_axis(available.height, min_h, max_h),
        );

        let core = self.measure_kind(ctx, id, constrained).sanitized();

        let node = self.node(id);
        let explicit_w = node.width.map(sanitize_extent);
        let explicit_h = node.height.map(sanitize_extent);
        let margin = node.margin.sanitized();

        let mut size = core;
        if let Some(w) = explicit_w {
            size.width = w;
        }
        if let Some(h) = explicit_h {
            size.height = h;
        }
        size.width = clamp_axis(size.width, min_w, max_w);
        size.height = clamp_axis(size.height, min_h, max_h);
        size = size.inflate(margin);
        size = size.min(available).max(Size::ZERO);

        let node = self.node_mut(id);
        node.desired = size;
        node.last_available = Some(available);
        node.dirty.remove(DirtyFlags::MEASURE);
        node.dirty.insert(DirtyFlags::ARRANGE);
        size
    }

    /// Dispatch the kind-specific sizing. Containers see the available
    /// space with their padding removed and report it back added.
    fn measure_kind(&mut self, ctx: &mut LayoutContext, id: NodeId, available: Size) -> Size {
        let tag = self.node(id).kind.tag();
        if tag == KindTag::Leaf {
            let node = self.node(id);
            return match &node.content {
                Some(content) => {
                    let size = content.measure(available);
                    if size.width.is_nan() || size.height.is_nan() {
                        trace!(target: "kui_layout", %id, "content measure returned NaN, clamping");
                    }
                    size
                }
                None => Size::ZERO,
            };
        }

        let padding = self.node(id).padding.sanitized();
        let inner = available.deflate(padding);
        let size = match tag {
            KindTag::Stack => stack::measure(self, ctx, id, inner),
            KindTag::Grid => grid::measure(self, ctx, id, inner),
            KindTag::Dock => dock::measure(self, ctx, id, inner),
            KindTag::Wrap => wrap::measure(self, ctx, id, inner),
            KindTag::Canvas => canvas::measure(self, ctx, id, inner),
            KindTag::Leaf => Size::ZERO,
        };
        size.inflate(padding)
    }

    /// Snapshot of a node's child ids, taken before recursing so the
    /// borrow does not span child passes.
    pub(crate) fn child_ids(&self, id: NodeId) -> smallvec::SmallVec<[NodeId; 8]> {
        self.node(id).children.iter().copied().collect()
    }

    /// Child ids that participate in layout (visible only).
    pub(crate) fn visible_child_ids(&self, id: NodeId) -> smallvec::SmallVec<[NodeId; 8]> {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|&c| self.node(c).visible)
            .collect()
    }

    pub(crate) fn stack_spec(&self, id: NodeId) -> (crate::Orientation, f32) {
        match &self.node(id).kind {
            Kind::Stack(spec) => (spec.orientation, sanitize_extent(spec.spacing)),
            _ => (crate::Orientation::Vertical, 0.0),
        }
    }

    pub(crate) fn dock_fill(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            Kind::Dock(spec) => spec.last_child_fill,
            _ => true,
        }
    }

    pub(crate) fn wrap_spec(&self, id: NodeId) -> (crate::Orientation, Option<f32>, Option<f32>) {
        match &self.node(id).kind {
            Kind::Wrap(spec) => (
                spec.orientation,
                spec.item_width.map(sanitize_extent),
                spec.item_height.map(sanitize_extent),
            ),
            _ => (crate::Orientation::Horizontal, None, None),
        }
    }
}
