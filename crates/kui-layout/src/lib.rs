#![forbid(unsafe_code)]

//! Retained-mode layout engine for Kestrel UI.
//!
//! This crate implements the two-pass Measure/Arrange protocol the rest of
//! the toolkit builds on:
//!
//! - [`LayoutTree`] - arena of [`LayoutNode`]s with parent/child links,
//!   per-node invalidation, and the Measure/Arrange entry points
//! - [`Kind`] - the closed set of container algorithms (stack, grid with
//!   star sizing, dock, wrap, absolute canvas) plus leaves
//! - [`LayoutContext`] - per-pass state: work counters and the repaint
//!   damage list handed to the rendering collaborator
//! - [`LayoutHost`] - the thin adapter a window surface uses to drive a
//!   pass and read back results
//! - [`debug`] - serializable tree snapshots for introspection
//!
//! # Protocol
//!
//! Measure descends the tree handing each node an available [`Size`]
//! (`+∞` = unconstrained) and ascends with the node's desired size, which
//! is cached and memoized against the offered size. Arrange descends with
//! final rectangles already decided, resolving margin and alignment on
//! the way down. Both passes are synchronous, single-threaded and
//! non-reentrant; all mutation must happen on the owning thread between
//! passes.
//!
//! ```
//! use kui_core::{Rect, Size};
//! use kui_layout::{LayoutContext, LayoutTree, Orientation};
//!
//! let mut tree = LayoutTree::new();
//! let root = tree.new_stack(Orientation::Vertical);
//! let label = tree.new_leaf_with(|_avail: Size| Size::new(120.0, 20.0));
//! tree.add_child(root, label).unwrap();
//!
//! let mut ctx = LayoutContext::new();
//! let desired = tree.measure(&mut ctx, root, Size::new(400.0, 300.0));
//! tree.arrange(&mut ctx, root, Rect::from_size(Size::new(400.0, 300.0)));
//! assert_eq!(desired, Size::new(120.0, 20.0));
//! ```

pub mod context;
pub mod debug;
pub mod host;
pub mod node;
pub mod tree;

mod arrange;
mod canvas;
mod dock;
mod grid;
mod measure;
mod stack;
mod wrap;

pub use context::{LayoutContext, PassStats};
pub use debug::{NodeSnapshot, TreeSnapshot};
pub use host::{LayoutHost, PassReport};
pub use kui_core::{Point, Rect, Sides, Size};
pub use node::{
    CanvasAnchors, ContentMeasure, DirtyFlags, DockEdge, GridPlacement, Kind, LayoutNode, NodeId,
    Track, TrackSizing,
};
pub use tree::{LayoutTree, TreeError};

/// The axis a [`Kind::Stack`] or [`Kind::Wrap`] container flows along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Orientation {
    /// Top to bottom.
    #[default]
    Vertical,
    /// Left to right.
    Horizontal,
}

impl Orientation {
    /// Extent of a size along this axis.
    #[inline]
    pub(crate) fn main_of(self, size: Size) -> f32 {
        match self {
            Orientation::Horizontal => size.width,
            Orientation::Vertical => size.height,
        }
    }

    /// Extent of a size across this axis.
    #[inline]
    pub(crate) fn cross_of(self, size: Size) -> f32 {
        match self {
            Orientation::Horizontal => size.height,
            Orientation::Vertical => size.width,
        }
    }

    /// Build a size from main/cross extents.
    #[inline]
    pub(crate) fn pack(self, main: f32, cross: f32) -> Size {
        match self {
            Orientation::Horizontal => Size::new(main, cross),
            Orientation::Vertical => Size::new(cross, main),
        }
    }
}

/// How a node positions itself within the slot its parent assigns.
///
/// Applied per axis by the arrangement finalizer. `Stretch` fills the
/// slot; the others size the node to its desired extent and place it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Alignment {
    /// Align to the left/top edge of the slot.
    Start,
    /// Center within the slot.
    Center,
    /// Align to the right/bottom edge of the slot.
    End,
    /// Fill the slot (default).
    #[default]
    Stretch,
}
