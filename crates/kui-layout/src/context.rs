#![forbid(unsafe_code)]

//! Per-pass layout state.
//!
//! A [`LayoutContext`] is created by the host for each pass and threaded
//! through the recursion. It replaces ambient global state: everything a
//! pass accumulates (work counters, repaint damage) lives here, so
//! independent trees can lay out in isolation and tests can observe
//! exactly what a pass did.

use kui_core::Rect;

/// Work counters for one or more passes.
///
/// `measure_cache_hits` counts memoized early-returns; a second measure
/// of an unchanged tree with the same available size should be all hits
/// and no recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Calls into `measure`, including memoized ones.
    pub measure_calls: u64,
    /// Measure calls satisfied from the cache.
    pub measure_cache_hits: u64,
    /// Calls into `arrange`, including skipped ones.
    pub arrange_calls: u64,
    /// Arrange calls skipped because the node was clean and the slot
    /// unchanged.
    pub arrange_skips: u64,
}

/// State accumulated during a layout pass.
#[derive(Debug, Default)]
pub struct LayoutContext {
    /// Work counters.
    pub stats: PassStats,
    damage: Vec<Rect>,
}

impl LayoutContext {
    /// Create a fresh context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a repaint region (the union of a node's old and new render
    /// rects). Fire-and-forget: the rendering collaborator drains these
    /// after the pass.
    pub(crate) fn push_damage(&mut self, region: Rect) {
        self.damage.push(region);
    }

    /// Repaint regions recorded so far.
    #[must_use]
    pub fn damage(&self) -> &[Rect] {
        &self.damage
    }

    /// Drain the recorded repaint regions.
    pub fn take_damage(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.damage)
    }
}
