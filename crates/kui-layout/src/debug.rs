#![forbid(unsafe_code)]

//! Layout introspection snapshots.
//!
//! A [`TreeSnapshot`] freezes the observable layout state of a subtree -
//! kind, visibility, desired size, render rect, dirty bits - into a
//! plain serializable structure, for golden tests, replay diffing and
//! log dumps. Capturing never mutates the tree.

use std::fmt::Write as _;

use kui_core::{Rect, Size};

use crate::node::{DirtyFlags, NodeId};
use crate::tree::LayoutTree;

/// Frozen layout state of one node and its children.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeSnapshot {
    /// The node's id within its tree.
    pub id: NodeId,
    /// Kind label: `leaf`, `stack`, `grid`, `dock`, `wrap` or `canvas`.
    pub kind: String,
    /// Whether the node participates in layout.
    pub visible: bool,
    /// Margin-inclusive desired size from the last measure.
    pub desired: Size,
    /// Absolute rectangle from the last arrange.
    pub render_rect: Rect,
    /// Whether the desired size is stale.
    pub needs_measure: bool,
    /// Whether the render rect is stale.
    pub needs_arrange: bool,
    /// Child snapshots in insertion order.
    pub children: Vec<NodeSnapshot>,
}

/// Frozen layout state of a whole subtree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TreeSnapshot {
    /// The captured root.
    pub root: NodeSnapshot,
}

impl TreeSnapshot {
    /// Capture the subtree under `root`, or `None` if the id is stale.
    #[must_use]
    pub fn capture(tree: &LayoutTree, root: NodeId) -> Option<Self> {
        capture_node(tree, root).map(|root| Self { root })
    }

    /// Indented text dump, one node per line, for logs and test
    /// failure output.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        dump_node(&self.root, 0, &mut out);
        out
    }
}

fn capture_node(tree: &LayoutTree, id: NodeId) -> Option<NodeSnapshot> {
    let node = tree.get(id)?;
    let children = tree
        .children(id)
        .iter()
        .filter_map(|&child| capture_node(tree, child))
        .collect();
    Some(NodeSnapshot {
        id,
        kind: node.kind().label().to_owned(),
        visible: node.is_visible(),
        desired: node.desired_size(),
        render_rect: node.render_rect(),
        needs_measure: node.dirty().contains(DirtyFlags::MEASURE),
        needs_arrange: node.dirty().contains(DirtyFlags::ARRANGE),
        children,
    })
}

fn dump_node(node: &NodeSnapshot, depth: usize, out: &mut String) {
    let r = node.render_rect;
    let _ = writeln!(
        out,
        "{:indent$}{} {} [{} {} {}x{}] desired {}x{}{}{}{}",
        "",
        node.kind,
        node.id,
        r.x,
        r.y,
        r.width,
        r.height,
        node.desired.width,
        node.desired.height,
        if node.visible { "" } else { " hidden" },
        if node.needs_measure { " !measure" } else { "" },
        if node.needs_arrange { " !arrange" } else { "" },
        indent = depth * 2,
    );
    for child in &node.children {
        dump_node(child, depth + 1, out);
    }
}
