#![forbid(unsafe_code)]

//! Layout node model.
//!
//! A [`LayoutNode`] is the unit participating in layout: it owns the
//! caller-set constraints (explicit size, min/max, margin, alignment,
//! visibility), the cached results of the last pass, and its [`Kind`].
//! Container kinds carry their per-child metadata in side-tables keyed by
//! [`NodeId`], never on the child itself, so metadata cannot outlive the
//! parent/child relationship it describes.

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;
use kui_core::{Rect, Sides, Size};

use crate::{Alignment, Orientation};

/// Stable handle for a node in a [`LayoutTree`](crate::LayoutTree).
///
/// Ids are arena indices, only meaningful for the tree that issued them.
/// A removed node's id goes stale; side-table entries keyed by it are
/// dropped at removal so a later reuse of the slot starts clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Per-node staleness flags.
    ///
    /// Invariant: `MEASURE` implies `ARRANGE` - a re-measured node must be
    /// re-arranged before its render rect is trusted. The tree's mutation
    /// helpers maintain this; the flags are never set directly elsewhere.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DirtyFlags: u8 {
        /// The cached desired size is stale.
        const MEASURE = 1 << 0;
        /// The cached render rect is stale.
        const ARRANGE = 1 << 1;
    }
}

/// Intrinsic content sizing for leaf nodes.
///
/// The rendering collaborator (text shaper, image decoder, ...) reports a
/// leaf's natural size through this seam. `available` carries the same
/// `+∞`-means-unconstrained convention as the measure pass.
pub trait ContentMeasure {
    /// Report the content's natural size within `available`.
    fn measure(&self, available: Size) -> Size;
}

impl<F> ContentMeasure for F
where
    F: Fn(Size) -> Size,
{
    fn measure(&self, available: Size) -> Size {
        self(available)
    }
}

/// Sizing policy for one grid track.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TrackSizing {
    /// Sized to the largest single-span child in the track.
    Auto,
    /// A fixed extent in pixels.
    Pixel(f32),
    /// A weighted share of the space left after Auto and Pixel tracks.
    Star(f32),
}

/// One row or column definition of a grid.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    /// Sizing policy.
    pub sizing: TrackSizing,
    /// Lower bound on the resolved extent.
    pub min: f32,
    /// Upper bound on the resolved extent.
    pub max: f32,
}

impl Track {
    /// An auto-sized track with no bounds.
    pub const fn auto() -> Self {
        Self {
            sizing: TrackSizing::Auto,
            min: 0.0,
            max: f32::INFINITY,
        }
    }

    /// A fixed-extent track.
    pub const fn pixel(extent: f32) -> Self {
        Self {
            sizing: TrackSizing::Pixel(extent),
            min: 0.0,
            max: f32::INFINITY,
        }
    }

    /// A proportional track with the given weight.
    pub const fn star(weight: f32) -> Self {
        Self {
            sizing: TrackSizing::Star(weight),
            min: 0.0,
            max: f32::INFINITY,
        }
    }

    /// Set the lower bound.
    #[must_use]
    pub const fn with_min(mut self, min: f32) -> Self {
        self.min = min;
        self
    }

    /// Set the upper bound.
    #[must_use]
    pub const fn with_max(mut self, max: f32) -> Self {
        self.max = max;
        self
    }
}

/// Grid cell assignment for one child.
///
/// Absent side-table entries read as the default: cell (0, 0), span 1x1.
/// Indices beyond the defined tracks clamp to the last track at arrange
/// time; they are stored as set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridPlacement {
    /// Row index, 0-based.
    pub row: usize,
    /// Column index, 0-based.
    pub column: usize,
    /// Number of rows covered, at least 1.
    pub row_span: usize,
    /// Number of columns covered, at least 1.
    pub column_span: usize,
}

impl Default for GridPlacement {
    fn default() -> Self {
        Self {
            row: 0,
            column: 0,
            row_span: 1,
            column_span: 1,
        }
    }
}

impl GridPlacement {
    /// Place a child in a single cell.
    pub const fn cell(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            row_span: 1,
            column_span: 1,
        }
    }

    /// Set the row span.
    #[must_use]
    pub const fn with_row_span(mut self, span: usize) -> Self {
        self.row_span = span;
        self
    }

    /// Set the column span.
    #[must_use]
    pub const fn with_column_span(mut self, span: usize) -> Self {
        self.column_span = span;
        self
    }
}

/// The edge a dock child attaches to.
///
/// Children without a side-table entry dock `Left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum DockEdge {
    /// Attach to the left edge.
    #[default]
    Left,
    /// Attach to the top edge.
    Top,
    /// Attach to the right edge.
    Right,
    /// Attach to the bottom edge.
    Bottom,
}

/// Canvas position for one child.
///
/// `left`/`top` offset from the canvas origin (default 0). When `right`
/// or `bottom` is set it takes precedence on that axis: the child is
/// offset from the canvas's far edge using the canvas's final size.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct CanvasAnchors {
    /// Offset of the child's left edge from the canvas's left edge.
    pub left: Option<f32>,
    /// Offset of the child's top edge from the canvas's top edge.
    pub top: Option<f32>,
    /// Offset of the child's right edge from the canvas's right edge.
    pub right: Option<f32>,
    /// Offset of the child's bottom edge from the canvas's bottom edge.
    pub bottom: Option<f32>,
}

impl CanvasAnchors {
    /// Anchor at an offset from the top-left corner.
    pub const fn top_left(left: f32, top: f32) -> Self {
        Self {
            left: Some(left),
            top: Some(top),
            right: None,
            bottom: None,
        }
    }
}

/// Stack container state.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSpec {
    /// Stacking axis.
    pub orientation: Orientation,
    /// Uniform gap between consecutive visible children.
    pub spacing: f32,
}

/// Grid container state: ordered track lists plus the placement
/// side-table.
#[derive(Debug, Clone, Default)]
pub struct GridSpec {
    /// Row definitions in order. Empty reads as one Auto row.
    pub rows: Vec<Track>,
    /// Column definitions in order. Empty reads as one Auto column.
    pub columns: Vec<Track>,
    pub(crate) placements: HashMap<NodeId, GridPlacement>,
}

/// Dock container state: the fill switch plus the edge side-table.
#[derive(Debug, Clone)]
pub struct DockSpec {
    /// Whether the last child receives all remaining space instead of
    /// docking to an edge. Defaults to true.
    pub last_child_fill: bool,
    pub(crate) edges: HashMap<NodeId, DockEdge>,
}

impl Default for DockSpec {
    fn default() -> Self {
        Self {
            last_child_fill: true,
            edges: HashMap::new(),
        }
    }
}

/// Wrap container state.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapSpec {
    /// Flow axis; lines accumulate along the cross axis.
    pub orientation: Orientation,
    /// Uniform slot width override for every child.
    pub item_width: Option<f32>,
    /// Uniform slot height override for every child.
    pub item_height: Option<f32>,
}

/// Canvas container state: the anchor side-table.
#[derive(Debug, Clone, Default)]
pub struct CanvasSpec {
    pub(crate) anchors: HashMap<NodeId, CanvasAnchors>,
}

/// The closed set of layout behaviors.
///
/// Dispatch is a single match per pass - no open inheritance hierarchy,
/// so the algorithm table stays flat and exhaustively testable.
#[derive(Debug)]
pub enum Kind {
    /// No children; sized by [`ContentMeasure`] or explicit constraints.
    Leaf,
    /// Linear layout along one axis with uniform spacing.
    Stack(StackSpec),
    /// Rows/columns with Auto, Pixel and Star tracks.
    Grid(GridSpec),
    /// Children carve strips off the container's edges in order.
    Dock(DockSpec),
    /// Flow layout that breaks into lines.
    Wrap(WrapSpec),
    /// Absolute positioning from per-child anchors.
    Canvas(CanvasSpec),
}

/// Discriminant snapshot of [`Kind`], used to dispatch a pass without
/// holding a borrow of the node across child recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KindTag {
    Leaf,
    Stack,
    Grid,
    Dock,
    Wrap,
    Canvas,
}

impl Kind {
    pub(crate) fn tag(&self) -> KindTag {
        match self {
            Kind::Leaf => KindTag::Leaf,
            Kind::Stack(_) => KindTag::Stack,
            Kind::Grid(_) => KindTag::Grid,
            Kind::Dock(_) => KindTag::Dock,
            Kind::Wrap(_) => KindTag::Wrap,
            Kind::Canvas(_) => KindTag::Canvas,
        }
    }

    /// Short label for logs and snapshots.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Kind::Leaf => "leaf",
            Kind::Stack(_) => "stack",
            Kind::Grid(_) => "grid",
            Kind::Dock(_) => "dock",
            Kind::Wrap(_) => "wrap",
            Kind::Canvas(_) => "canvas",
        }
    }

    /// Whether this kind places children.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        !matches!(self, Kind::Leaf)
    }

    /// Drop the side-table entry for `child`, if this kind keeps one.
    pub(crate) fn forget_child(&mut self, child: NodeId) {
        match self {
            Kind::Grid(spec) => {
                spec.placements.remove(&child);
            }
            Kind::Dock(spec) => {
                spec.edges.remove(&child);
            }
            Kind::Canvas(spec) => {
                spec.anchors.remove(&child);
            }
            Kind::Leaf | Kind::Stack(_) | Kind::Wrap(_) => {}
        }
    }
}

/// One visual element's layout state.
///
/// Created through the [`LayoutTree`](crate::LayoutTree) constructors and
/// owned by it; a parent container exclusively owns its children, and the
/// parent back-reference is a non-owning link used only for invalidation
/// bubbling and hit-test ancestry.
pub struct LayoutNode {
    pub(crate) kind: Kind,

    // Caller-set constraints.
    pub(crate) width: Option<f32>,
    pub(crate) height: Option<f32>,
    pub(crate) min_width: f32,
    pub(crate) max_width: f32,
    pub(crate) min_height: f32,
    pub(crate) max_height: f32,
    pub(crate) margin: Sides,
    pub(crate) padding: Sides,
    pub(crate) halign: Alignment,
    pub(crate) valign: Alignment,
    pub(crate) visible: bool,

    // Tree links.
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,

    // Cached pass results.
    pub(crate) desired: Size,
    pub(crate) render_rect: Rect,
    pub(crate) last_available: Option<Size>,
    pub(crate) last_slot: Option<Rect>,
    /// Alignment overrides the parent applied at the last arrange
    /// (stack placement forces the cross axis to stretch); replayed by
    /// in-place re-arranges.
    pub(crate) slot_overrides: (Option<Alignment>, Option<Alignment>),
    pub(crate) dirty: DirtyFlags,

    pub(crate) content: Option<Box<dyn ContentMeasure>>,
}

impl LayoutNode {
    pub(crate) fn new(kind: Kind) -> Self {
        Self {
            kind,
            width: None,
            height: None,
            min_width: 0.0,
            max_width: f32::INFINITY,
            min_height: 0.0,
            max_height: f32::INFINITY,
            margin: Sides::ZERO,
            padding: Sides::ZERO,
            halign: Alignment::Stretch,
            valign: Alignment::Stretch,
            visible: true,
            parent: None,
            children: Vec::new(),
            desired: Size::ZERO,
            render_rect: Rect::ZERO,
            last_available: None,
            last_slot: None,
            slot_overrides: (None, None),
            dirty: DirtyFlags::MEASURE | DirtyFlags::ARRANGE,
            content: None,
        }
    }

    /// The node's layout behavior.
    #[inline]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Result of the last measure pass, margin-inclusive.
    #[inline]
    pub fn desired_size(&self) -> Size {
        self.desired
    }

    /// Absolute rectangle from the last arrange pass.
    #[inline]
    pub fn render_rect(&self) -> Rect {
        self.render_rect
    }

    /// Current staleness flags.
    #[inline]
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Whether the node participates in layout.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Explicit width, if set.
    #[inline]
    pub fn width(&self) -> Option<f32> {
        self.width
    }

    /// Explicit height, if set.
    #[inline]
    pub fn height(&self) -> Option<f32> {
        self.height
    }

    /// Outer margin.
    #[inline]
    pub fn margin(&self) -> Sides {
        self.margin
    }

    /// Inner padding (consumed by container kinds).
    #[inline]
    pub fn padding(&self) -> Sides {
        self.padding
    }

    /// Horizontal alignment within the parent-assigned slot.
    #[inline]
    pub fn halign(&self) -> Alignment {
        self.halign
    }

    /// Vertical alignment within the parent-assigned slot.
    #[inline]
    pub fn valign(&self) -> Alignment {
        self.valign
    }

    /// Mark the desired size stale. Keeps the MEASURE-implies-ARRANGE
    /// invariant.
    #[inline]
    pub(crate) fn mark_needs_measure(&mut self) {
        self.dirty |= DirtyFlags::MEASURE | DirtyFlags::ARRANGE;
    }

    /// Mark only the render rect stale.
    #[inline]
    pub(crate) fn mark_needs_arrange(&mut self) {
        self.dirty |= DirtyFlags::ARRANGE;
    }
}

impl fmt::Debug for LayoutNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutNode")
            .field("kind", &self.kind.label())
            .field("children", &self.children.len())
            .field("desired", &self.desired)
            .field("render_rect", &self.render_rect)
            .field("dirty", &self.dirty)
            .field("visible", &self.visible)
            .field("content", &self.content.as_ref().map(|_| "..."))
            .finish()
    }
}
