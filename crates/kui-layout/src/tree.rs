#![forbid(unsafe_code)]

//! The layout tree: node storage, structure mutation, invalidation.
//!
//! Nodes live in an arena owned by [`LayoutTree`]; the tree hands out
//! [`NodeId`] index handles instead of references, so parent links can be
//! plain non-owning ids and per-container side-tables can key on child
//! identity without lifetime hazards.
//!
//! Structure rules:
//!
//! - a parent exclusively owns its children; [`LayoutTree::add_child`]
//!   detaches a node from any prior parent before attaching it
//! - removing a child destroys its whole subtree and drops any side-table
//!   metadata the former parent held for it
//! - cyclic graphs are a caller error and are not defended beyond
//!   rejecting `child == parent`; a cycle will recurse until overflow

use kui_core::Point;
use tracing::trace;

use crate::node::{
    CanvasAnchors, CanvasSpec, ContentMeasure, DirtyFlags, DockEdge, DockSpec, GridPlacement,
    GridSpec, Kind, LayoutNode, NodeId, StackSpec, Track, WrapSpec,
};
use crate::{Alignment, Orientation, Sides};

/// Error from a structural tree operation.
///
/// Layout passes never return errors (degenerate inputs clamp instead);
/// these only arise from misusing the mutation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The id does not refer to a live node of this tree.
    StaleNode {
        /// The offending id.
        id: NodeId,
    },
    /// Attempted to attach a node to itself.
    SelfChild {
        /// The offending id.
        id: NodeId,
    },
    /// The child is not currently attached to the given parent.
    NotAChild {
        /// The parent passed in.
        parent: NodeId,
        /// The child passed in.
        child: NodeId,
    },
    /// The operation requires a different container kind.
    KindMismatch {
        /// The node passed in.
        node: NodeId,
        /// The kind the operation needs.
        expected: &'static str,
    },
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeError::StaleNode { id } => write!(f, "node {id} is not alive in this tree"),
            TreeError::SelfChild { id } => write!(f, "node {id} cannot be its own child"),
            TreeError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of {parent}")
            }
            TreeError::KindMismatch { node, expected } => {
                write!(f, "node {node} is not a {expected} container")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Arena of layout nodes plus the invalidation state shared with the
/// host.
#[derive(Debug, Default)]
pub struct LayoutTree {
    slots: Vec<Option<LayoutNode>>,
    free: Vec<u32>,
    /// Nodes whose arrange-only invalidation awaits an in-place
    /// re-arrange by the host. Measure invalidations bubble to the root
    /// instead and are handled by the full pass.
    pending_arrange: Vec<NodeId>,
}

impl LayoutTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` refers to a live node of this tree.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    /// Shared access to a node, `None` if the id is stale.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&LayoutNode> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn node(&self, id: NodeId) -> &LayoutNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node id {id}"),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut LayoutNode {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("stale node id {id}"),
        }
    }

    fn alloc(&mut self, node: LayoutNode) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(node);
            NodeId(index)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Some(node));
            NodeId(index)
        }
    }

    // --- Node construction ---

    /// Create a leaf with no intrinsic content (measures to zero unless
    /// an explicit size is set).
    pub fn new_leaf(&mut self) -> NodeId {
        self.alloc(LayoutNode::new(Kind::Leaf))
    }

    /// Create a leaf whose natural size comes from `content`.
    pub fn new_leaf_with(&mut self, content: impl ContentMeasure + 'static) -> NodeId {
        let mut node = LayoutNode::new(Kind::Leaf);
        node.content = Some(Box::new(content));
        self.alloc(node)
    }

    /// Create a stack container.
    pub fn new_stack(&mut self, orientation: Orientation) -> NodeId {
        self.alloc(LayoutNode::new(Kind::Stack(StackSpec {
            orientation,
            spacing: 0.0,
        })))
    }

    /// Create a grid container with no track definitions yet.
    ///
    /// A grid with zero rows or columns lays out as if it had one Auto
    /// track on that axis.
    pub fn new_grid(&mut self) -> NodeId {
        self.alloc(LayoutNode::new(Kind::Grid(GridSpec::default())))
    }

    /// Create a dock container (`last_child_fill` defaults to true).
    pub fn new_dock(&mut self) -> NodeId {
        self.alloc(LayoutNode::new(Kind::Dock(DockSpec::default())))
    }

    /// Create a wrap container flowing along `orientation`.
    pub fn new_wrap(&mut self, orientation: Orientation) -> NodeId {
        self.alloc(LayoutNode::new(Kind::Wrap(WrapSpec {
            orientation,
            item_width: None,
            item_height: None,
        })))
    }

    /// Create a canvas container.
    pub fn new_canvas(&mut self) -> NodeId {
        self.alloc(LayoutNode::new(Kind::Canvas(CanvasSpec::default())))
    }

    // --- Structure ---

    /// Parent of `id`, if attached.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of `id` in insertion order (which is also hit-test
    /// z-order, last on top).
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Append `child` to `parent`, detaching it from any prior parent
    /// first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let index = self.check_attach(parent, child)?.children.len();
        self.attach_at(parent, index, child);
        Ok(())
    }

    /// Insert `child` under `parent` at `index` (clamped to the child
    /// count), detaching it from any prior parent first.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        let index = index.min(self.check_attach(parent, child)?.children.len());
        self.attach_at(parent, index, child);
        Ok(())
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<&LayoutNode, TreeError> {
        if parent == child {
            return Err(TreeError::SelfChild { id: parent });
        }
        if !self.contains(child) {
            return Err(TreeError::StaleNode { id: child });
        }
        self.get(parent).ok_or(TreeError::StaleNode { id: parent })
    }

    fn attach_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let index = index.min(self.node(parent).children.len());
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        trace!(target: "kui_layout", %parent, %child, "attach");
        self.invalidate_measure(parent);
    }

    /// Unlink `child` from its parent, if any, dropping the parent's
    /// side-table entry for it. The child and its subtree stay alive.
    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).parent else {
            return;
        };
        let parent_node = self.node_mut(parent);
        parent_node.children.retain(|&c| c != child);
        parent_node.kind.forget_child(child);
        self.node_mut(child).parent = None;
        self.invalidate_measure(parent);
    }

    /// Remove `child` from `parent` and destroy its whole subtree.
    ///
    /// The former parent is marked for re-measure; side-table metadata
    /// for the child is dropped with it.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::StaleNode { id: parent });
        }
        if self.get(child).ok_or(TreeError::StaleNode { id: child })?.parent != Some(parent) {
            return Err(TreeError::NotAChild { parent, child });
        }
        self.detach(child);
        trace!(target: "kui_layout", %parent, %child, "remove subtree");
        self.free_subtree(child);
        Ok(())
    }

    fn free_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.slots.get_mut(id.index()).and_then(Option::take) {
                stack.extend(node.children);
                self.free.push(id.0);
            }
        }
    }

    // --- Invalidation ---

    /// Mark `id` as needing measure (and arrange), bubbling the flags to
    /// every ancestor up to the root.
    ///
    /// Stops early once it reaches an ancestor that is already
    /// measure-dirty, so repeated invalidations cost O(depth) amortized.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn invalidate_measure(&mut self, id: NodeId) {
        let mut current = id;
        let mut is_origin = true;
        loop {
            let node = self.node_mut(current);
            if !is_origin && node.dirty.contains(DirtyFlags::MEASURE) {
                break;
            }
            node.mark_needs_measure();
            is_origin = false;
            match node.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }

    /// Mark `id` as needing arrange only. Does not propagate: a
    /// reposition does not force ancestors to re-measure.
    ///
    /// The node is queued for an in-place re-arrange on the host's next
    /// [`update_layout`](crate::LayoutHost::update_layout).
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn invalidate_arrange(&mut self, id: NodeId) {
        self.node_mut(id).mark_needs_arrange();
        self.pending_arrange.push(id);
    }

    /// Whether any arrange-only invalidations await the host.
    #[must_use]
    pub fn has_pending_arrange(&self) -> bool {
        !self.pending_arrange.is_empty()
    }

    pub(crate) fn take_pending_arrange(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.pending_arrange)
    }

    // --- Constraint properties ---
    //
    // Every setter invalidates before returning: size-affecting
    // properties re-measure, position-only properties re-arrange.

    /// Set or clear the explicit width.
    ///
    /// # Panics
    ///
    /// All property setters panic if `id` is stale.
    pub fn set_width(&mut self, id: NodeId, width: Option<f32>) {
        self.node_mut(id).width = width;
        self.invalidate_measure(id);
    }

    /// Set or clear the explicit height.
    pub fn set_height(&mut self, id: NodeId, height: Option<f32>) {
        self.node_mut(id).height = height;
        self.invalidate_measure(id);
    }

    /// Set the minimum width.
    pub fn set_min_width(&mut self, id: NodeId, min: f32) {
        self.node_mut(id).min_width = min;
        self.invalidate_measure(id);
    }

    /// Set the maximum width.
    pub fn set_max_width(&mut self, id: NodeId, max: f32) {
        self.node_mut(id).max_width = max;
        self.invalidate_measure(id);
    }

    /// Set the minimum height.
    pub fn set_min_height(&mut self, id: NodeId, min: f32) {
        self.node_mut(id).min_height = min;
        self.invalidate_measure(id);
    }

    /// Set the maximum height.
    pub fn set_max_height(&mut self, id: NodeId, max: f32) {
        self.node_mut(id).max_height = max;
        self.invalidate_measure(id);
    }

    /// Set the outer margin.
    pub fn set_margin(&mut self, id: NodeId, margin: impl Into<Sides>) {
        self.node_mut(id).margin = margin.into();
        self.invalidate_measure(id);
    }

    /// Set the inner padding. Only container kinds consume it.
    pub fn set_padding(&mut self, id: NodeId, padding: impl Into<Sides>) {
        self.node_mut(id).padding = padding.into();
        self.invalidate_measure(id);
    }

    /// Show or hide the node. Hidden nodes measure to zero and are
    /// skipped by container placement.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        let node = self.node_mut(id);
        if node.visible != visible {
            node.visible = visible;
            self.invalidate_measure(id);
        }
    }

    /// Set the horizontal alignment. Reposition only: no re-measure.
    pub fn set_halign(&mut self, id: NodeId, align: Alignment) {
        self.node_mut(id).halign = align;
        self.invalidate_arrange(id);
    }

    /// Set the vertical alignment. Reposition only: no re-measure.
    pub fn set_valign(&mut self, id: NodeId, align: Alignment) {
        self.node_mut(id).valign = align;
        self.invalidate_arrange(id);
    }

    /// Replace the leaf's content measurer.
    pub fn set_content(&mut self, id: NodeId, content: impl ContentMeasure + 'static) {
        self.node_mut(id).content = Some(Box::new(content));
        self.invalidate_measure(id);
    }

    // --- Container-specific properties ---

    /// Set the gap between consecutive visible children of a stack.
    pub fn set_spacing(&mut self, id: NodeId, spacing: f32) -> Result<(), TreeError> {
        match &mut self.try_node_mut(id)?.kind {
            Kind::Stack(spec) => spec.spacing = spacing,
            _ => {
                return Err(TreeError::KindMismatch {
                    node: id,
                    expected: "stack",
                });
            }
        }
        self.invalidate_measure(id);
        Ok(())
    }

    /// Toggle whether a dock's last child fills the remaining frame.
    pub fn set_last_child_fill(&mut self, id: NodeId, fill: bool) -> Result<(), TreeError> {
        match &mut self.try_node_mut(id)?.kind {
            Kind::Dock(spec) => spec.last_child_fill = fill,
            _ => {
                return Err(TreeError::KindMismatch {
                    node: id,
                    expected: "dock",
                });
            }
        }
        self.invalidate_measure(id);
        Ok(())
    }

    /// Set a wrap's uniform slot width override.
    pub fn set_item_width(&mut self, id: NodeId, width: Option<f32>) -> Result<(), TreeError> {
        match &mut self.try_node_mut(id)?.kind {
            Kind::Wrap(spec) => spec.item_width = width,
            _ => {
                return Err(TreeError::KindMismatch {
                    node: id,
                    expected: "wrap",
                });
            }
        }
        self.invalidate_measure(id);
        Ok(())
    }

    /// Set a wrap's uniform slot height override.
    pub fn set_item_height(&mut self, id: NodeId, height: Option<f32>) -> Result<(), TreeError> {
        match &mut self.try_node_mut(id)?.kind {
            Kind::Wrap(spec) => spec.item_height = height,
            _ => {
                return Err(TreeError::KindMismatch {
                    node: id,
                    expected: "wrap",
                });
            }
        }
        self.invalidate_measure(id);
        Ok(())
    }

    /// Append a row definition to a grid.
    pub fn add_row(&mut self, id: NodeId, track: Track) -> Result<(), TreeError> {
        match &mut self.try_node_mut(id)?.kind {
            Kind::Grid(spec) => spec.rows.push(track),
            _ => {
                return Err(TreeError::KindMismatch {
                    node: id,
                    expected: "grid",
                });
            }
        }
        self.invalidate_measure(id);
        Ok(())
    }

    /// Append a column definition to a grid.
    pub fn add_column(&mut self, id: NodeId, track: Track) -> Result<(), TreeError> {
        match &mut self.try_node_mut(id)?.kind {
            Kind::Grid(spec) => spec.columns.push(track),
            _ => {
                return Err(TreeError::KindMismatch {
                    node: id,
                    expected: "grid",
                });
            }
        }
        self.invalidate_measure(id);
        Ok(())
    }

    /// Row definitions of a grid; empty for other kinds.
    #[must_use]
    pub fn rows(&self, id: NodeId) -> &[Track] {
        match self.get(id).map(|n| &n.kind) {
            Some(Kind::Grid(spec)) => &spec.rows,
            _ => &[],
        }
    }

    /// Column definitions of a grid; empty for other kinds.
    #[must_use]
    pub fn columns(&self, id: NodeId) -> &[Track] {
        match self.get(id).map(|n| &n.kind) {
            Some(Kind::Grid(spec)) => &spec.columns,
            _ => &[],
        }
    }

    // --- Side-table attached properties ---
    //
    // Keyed by child identity and owned by the container; dropped when
    // the child detaches, so metadata survives reparenting only if
    // explicitly re-set.

    /// Assign a grid cell to `child`.
    pub fn set_grid_placement(
        &mut self,
        grid: NodeId,
        child: NodeId,
        placement: GridPlacement,
    ) -> Result<(), TreeError> {
        if !self.contains(child) {
            return Err(TreeError::StaleNode { id: child });
        }
        match &mut self.try_node_mut(grid)?.kind {
            Kind::Grid(spec) => {
                spec.placements.insert(child, placement);
            }
            _ => {
                return Err(TreeError::KindMismatch {
                    node: grid,
                    expected: "grid",
                });
            }
        }
        self.invalidate_measure(grid);
        Ok(())
    }

    /// The grid cell assigned to `child`, or the default (0, 0, 1x1).
    #[must_use]
    pub fn grid_placement(&self, grid: NodeId, child: NodeId) -> GridPlacement {
        match self.get(grid).map(|n| &n.kind) {
            Some(Kind::Grid(spec)) => spec.placements.get(&child).copied().unwrap_or_default(),
            _ => GridPlacement::default(),
        }
    }

    /// Assign a dock edge to `child`.
    pub fn set_dock_edge(
        &mut self,
        dock: NodeId,
        child: NodeId,
        edge: DockEdge,
    ) -> Result<(), TreeError> {
        if !self.contains(child) {
            return Err(TreeError::StaleNode { id: child });
        }
        match &mut self.try_node_mut(dock)?.kind {
            Kind::Dock(spec) => {
                spec.edges.insert(child, edge);
            }
            _ => {
                return Err(TreeError::KindMismatch {
                    node: dock,
                    expected: "dock",
                });
            }
        }
        self.invalidate_measure(dock);
        Ok(())
    }

    /// The dock edge assigned to `child`, or [`DockEdge::Left`].
    #[must_use]
    pub fn dock_edge(&self, dock: NodeId, child: NodeId) -> DockEdge {
        match self.get(dock).map(|n| &n.kind) {
            Some(Kind::Dock(spec)) => spec.edges.get(&child).copied().unwrap_or_default(),
            _ => DockEdge::default(),
        }
    }

    /// Assign canvas anchors to `child`.
    pub fn set_canvas_anchors(
        &mut self,
        canvas: NodeId,
        child: NodeId,
        anchors: CanvasAnchors,
    ) -> Result<(), TreeError> {
        if !self.contains(child) {
            return Err(TreeError::StaleNode { id: child });
        }
        match &mut self.try_node_mut(canvas)?.kind {
            Kind::Canvas(spec) => {
                spec.anchors.insert(child, anchors);
            }
            _ => {
                return Err(TreeError::KindMismatch {
                    node: canvas,
                    expected: "canvas",
                });
            }
        }
        self.invalidate_measure(canvas);
        Ok(())
    }

    /// The anchors assigned to `child`, or all-unset.
    #[must_use]
    pub fn canvas_anchors(&self, canvas: NodeId, child: NodeId) -> CanvasAnchors {
        match self.get(canvas).map(|n| &n.kind) {
            Some(Kind::Canvas(spec)) => spec.anchors.get(&child).copied().unwrap_or_default(),
            _ => CanvasAnchors::default(),
        }
    }

    fn try_node_mut(&mut self, id: NodeId) -> Result<&mut LayoutNode, TreeError> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::StaleNode { id })
    }

    // --- Hit testing ---

    /// Find the deepest visible node under `point`, walking children in
    /// reverse insertion order (topmost first).
    ///
    /// Uses the render rects of the last completed pass; results are
    /// meaningless while the tree is dirty.
    #[must_use]
    pub fn hit_test(&self, root: NodeId, point: Point) -> Option<NodeId> {
        let node = self.get(root)?;
        if !node.visible || !node.render_rect.contains(point) {
            return None;
        }
        for &child in node.children.iter().rev() {
            if let Some(hit) = self.hit_test(child, point) {
                return Some(hit);
            }
        }
        Some(root)
    }
}
