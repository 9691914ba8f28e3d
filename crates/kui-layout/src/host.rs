#![forbid(unsafe_code)]

//! Host adapter: the glue a window surface uses to drive layout.
//!
//! A [`LayoutHost`] tracks the root node and the current viewport and
//! exposes a single [`update_layout`](LayoutHost::update_layout) entry
//! point. The host process is expected to coalesce invalidations and
//! call it once per frame; the adapter then decides whether a full
//! measure+arrange pass is needed, or only the in-place re-arrange of
//! nodes whose [`invalidate_arrange`](crate::LayoutTree::invalidate_arrange)
//! did not bubble.

use kui_core::{Rect, Size};
use tracing::debug;

use crate::context::{LayoutContext, PassStats};
use crate::node::{DirtyFlags, NodeId};
use crate::tree::LayoutTree;

/// What one [`LayoutHost::update_layout`] call did.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Work counters for the pass.
    pub stats: PassStats,
    /// Repaint regions (old ∪ new render rects) for the rendering
    /// collaborator. Fire-and-forget; no acknowledgment is expected.
    pub damage: Vec<Rect>,
}

/// Drives layout passes over one tree on behalf of a window surface.
#[derive(Debug)]
pub struct LayoutHost {
    root: NodeId,
    viewport: Size,
    viewport_changed: bool,
}

impl LayoutHost {
    /// Create a host for `root` with a zero viewport.
    #[must_use]
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            viewport: Size::ZERO,
            viewport_changed: true,
        }
    }

    /// The root node this host lays out.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The current viewport size.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Record a new viewport size, e.g. after a window resize.
    pub fn set_viewport(&mut self, size: Size) {
        let size = size.sanitized();
        if size != self.viewport {
            self.viewport = size;
            self.viewport_changed = true;
        }
    }

    /// Whether the next [`update_layout`](Self::update_layout) call has
    /// work to do.
    #[must_use]
    pub fn needs_pass(&self, tree: &LayoutTree) -> bool {
        self.viewport_changed
            || tree.has_pending_arrange()
            || tree
                .get(self.root)
                .is_some_and(|node| !node.dirty().is_empty())
    }

    /// Run whatever layout work is pending: a full measure+arrange pass
    /// when the viewport changed or a measure invalidation bubbled to
    /// the root, otherwise in-place re-arranges of the nodes queued by
    /// arrange-only invalidations.
    ///
    /// Idempotent between invalidations: calling it again immediately
    /// reports no damage and (at most) cache hits.
    pub fn update_layout(&mut self, tree: &mut LayoutTree) -> PassReport {
        if !tree.contains(self.root) {
            return PassReport::default();
        }
        let mut ctx = LayoutContext::new();

        let full = self.viewport_changed
            || tree
                .get(self.root)
                .is_some_and(|node| node.dirty().contains(DirtyFlags::MEASURE));
        if full {
            tree.measure(&mut ctx, self.root, self.viewport);
            tree.arrange(&mut ctx, self.root, Rect::from_size(self.viewport));
            self.viewport_changed = false;
        }
        // Drain arrange-only invalidations even after a full pass: the
        // descent skips clean ancestors, so a queued node under one was
        // not visited. Nodes the pass did visit are clean again and
        // skip here at the cost of a counter tick.
        for id in tree.take_pending_arrange() {
            // A queued node may have been removed, or may never have
            // been arranged; it has no slot to re-arrange into then.
            let Some(slot) = tree.get(id).and_then(|node| node.last_slot) else {
                continue;
            };
            // Replay whatever alignment overrides the parent's
            // placement applied last time.
            let (halign, valign) = tree.get(id).map_or((None, None), |n| n.slot_overrides);
            tree.arrange_in_slot(&mut ctx, id, slot, halign, valign);
        }

        let stats = ctx.stats;
        let damage = ctx.take_damage();
        debug!(
            target: "kui_layout",
            full,
            measure_calls = stats.measure_calls,
            measure_cache_hits = stats.measure_cache_hits,
            arrange_calls = stats.arrange_calls,
            arrange_skips = stats.arrange_skips,
            damage = damage.len(),
            "layout pass"
        );
        PassReport { stats, damage }
    }
}
