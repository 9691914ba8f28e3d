//! Cross-container invariants of the Measure/Arrange protocol.
//!
//! The concrete cases pin the documented container behaviors end to
//! end through [`LayoutHost`]; the property section checks idempotence,
//! non-negativity and containment over randomized bounded trees mixing
//! every container kind.

use kui_core::{Rect, Size};
use kui_layout::{
    CanvasAnchors, DirtyFlags, DockEdge, GridPlacement, LayoutContext, LayoutHost, LayoutTree,
    NodeId, Orientation, Track,
};
use proptest::prelude::*;

fn fixed_leaf(tree: &mut LayoutTree, w: f32, h: f32) -> NodeId {
    tree.new_leaf_with(move |_: Size| Size::new(w, h))
}

// ============================================================================
// Concrete cases
// ============================================================================

#[test]
fn stack_total_is_sum_of_children_plus_gaps() {
    let mut tree = LayoutTree::new();
    let stack = tree.new_stack(Orientation::Vertical);
    tree.set_spacing(stack, 7.0).unwrap();
    let heights = [12.0, 30.0, 5.0, 22.0];
    for h in heights {
        let leaf = fixed_leaf(&mut tree, 10.0, h);
        tree.add_child(stack, leaf).unwrap();
    }

    let mut ctx = LayoutContext::new();
    let desired = tree.measure(&mut ctx, stack, Size::new(500.0, 500.0));
    let expected: f32 = heights.iter().sum::<f32>() + 7.0 * (heights.len() - 1) as f32;
    assert_eq!(desired.height, expected);
}

#[test]
fn grid_star_one_to_two_splits_300_as_100_200() {
    let mut tree = LayoutTree::new();
    let grid = tree.new_grid();
    tree.add_column(grid, Track::star(1.0)).unwrap();
    tree.add_column(grid, Track::star(2.0)).unwrap();
    let a = fixed_leaf(&mut tree, 1.0, 1.0);
    let b = fixed_leaf(&mut tree, 1.0, 1.0);
    tree.add_child(grid, a).unwrap();
    tree.add_child(grid, b).unwrap();
    tree.set_grid_placement(grid, b, GridPlacement::cell(0, 1))
        .unwrap();

    let mut host = LayoutHost::new(grid);
    host.set_viewport(Size::new(300.0, 100.0));
    host.update_layout(&mut tree);

    assert_eq!(tree.get(a).unwrap().render_rect().width, 100.0);
    assert_eq!(tree.get(b).unwrap().render_rect().width, 200.0);
}

#[test]
fn grid_span_clamps_to_defined_columns() {
    let mut tree = LayoutTree::new();
    let grid = tree.new_grid();
    tree.add_column(grid, Track::star(1.0)).unwrap();
    tree.add_column(grid, Track::star(1.0)).unwrap();
    let child = fixed_leaf(&mut tree, 1.0, 1.0);
    tree.add_child(grid, child).unwrap();
    tree.set_grid_placement(grid, child, GridPlacement::cell(0, 0).with_column_span(5))
        .unwrap();

    let mut host = LayoutHost::new(grid);
    host.set_viewport(Size::new(200.0, 100.0));
    host.update_layout(&mut tree);

    let rect = tree.get(child).unwrap().render_rect();
    assert_eq!(rect.x, 0.0);
    assert_eq!(rect.width, 200.0);
}

#[test]
fn canvas_desired_is_the_child_bounding_box() {
    let mut tree = LayoutTree::new();
    let canvas = tree.new_canvas();
    let a = fixed_leaf(&mut tree, 50.0, 50.0);
    let b = fixed_leaf(&mut tree, 30.0, 30.0);
    tree.add_child(canvas, a).unwrap();
    tree.add_child(canvas, b).unwrap();
    tree.set_canvas_anchors(canvas, a, CanvasAnchors::top_left(10.0, 20.0))
        .unwrap();
    tree.set_canvas_anchors(canvas, b, CanvasAnchors::top_left(100.0, 5.0))
        .unwrap();

    let mut ctx = LayoutContext::new();
    let desired = tree.measure(&mut ctx, canvas, Size::new(1000.0, 1000.0));
    assert_eq!(desired, Size::new(130.0, 70.0));
}

#[test]
fn wrap_packs_five_hundreds_into_250_as_2_2_1() {
    let mut tree = LayoutTree::new();
    let wrap = tree.new_wrap(Orientation::Horizontal);
    let children: Vec<_> = (0..5)
        .map(|_| {
            let leaf = fixed_leaf(&mut tree, 100.0, 40.0);
            tree.add_child(wrap, leaf).unwrap();
            leaf
        })
        .collect();

    let mut host = LayoutHost::new(wrap);
    host.set_viewport(Size::new(250.0, 500.0));
    host.update_layout(&mut tree);

    let ys: Vec<_> = children
        .iter()
        .map(|&c| tree.get(c).unwrap().render_rect().y)
        .collect();
    // Lines of 2, 2 and 1; child 2 sits exactly one line height down.
    assert_eq!(ys, vec![0.0, 0.0, 40.0, 40.0, 80.0]);
}

#[test]
fn dock_carves_in_child_order_and_fills_last() {
    let mut tree = LayoutTree::new();
    let dock = tree.new_dock();
    let top = fixed_leaf(&mut tree, 0.0, 24.0);
    let left = fixed_leaf(&mut tree, 120.0, 0.0);
    let body = fixed_leaf(&mut tree, 0.0, 0.0);
    tree.add_child(dock, top).unwrap();
    tree.add_child(dock, left).unwrap();
    tree.add_child(dock, body).unwrap();
    tree.set_dock_edge(dock, top, DockEdge::Top).unwrap();
    tree.set_dock_edge(dock, left, DockEdge::Left).unwrap();

    let mut host = LayoutHost::new(dock);
    host.set_viewport(Size::new(800.0, 600.0));
    host.update_layout(&mut tree);

    assert_eq!(
        tree.get(body).unwrap().render_rect(),
        Rect::new(120.0, 24.0, 680.0, 576.0)
    );
}

#[test]
fn leaf_invalidation_bubbles_through_every_ancestor() {
    let mut tree = LayoutTree::new();
    let root = tree.new_stack(Orientation::Vertical);
    let mut ancestors = vec![root];
    let mut parent = root;
    for _ in 0..6 {
        let next = tree.new_stack(Orientation::Horizontal);
        tree.add_child(parent, next).unwrap();
        ancestors.push(next);
        parent = next;
    }
    let leaf = fixed_leaf(&mut tree, 10.0, 10.0);
    tree.add_child(parent, leaf).unwrap();

    let mut host = LayoutHost::new(root);
    host.set_viewport(Size::new(400.0, 400.0));
    host.update_layout(&mut tree);
    assert!(!host.needs_pass(&tree));

    tree.invalidate_measure(leaf);
    for &id in &ancestors {
        assert!(
            tree.get(id).unwrap().dirty().contains(DirtyFlags::MEASURE),
            "ancestor {id} not dirtied"
        );
    }
    assert!(host.needs_pass(&tree));
}

#[test]
fn mixed_tree_lays_out_end_to_end() {
    let mut tree = LayoutTree::new();
    let dock = tree.new_dock();
    let toolbar = fixed_leaf(&mut tree, 0.0, 32.0);
    tree.add_child(dock, toolbar).unwrap();
    tree.set_dock_edge(dock, toolbar, DockEdge::Top).unwrap();

    let grid = tree.new_grid();
    tree.add_column(grid, Track::pixel(200.0)).unwrap();
    tree.add_column(grid, Track::star(1.0)).unwrap();
    tree.add_row(grid, Track::star(1.0)).unwrap();
    tree.add_child(dock, grid).unwrap();

    let sidebar = tree.new_stack(Orientation::Vertical);
    tree.add_child(grid, sidebar).unwrap();
    for _ in 0..3 {
        let item = fixed_leaf(&mut tree, 180.0, 28.0);
        tree.add_child(sidebar, item).unwrap();
    }

    let content = fixed_leaf(&mut tree, 0.0, 0.0);
    tree.add_child(grid, content).unwrap();
    tree.set_grid_placement(grid, content, GridPlacement::cell(0, 1))
        .unwrap();

    let mut host = LayoutHost::new(dock);
    host.set_viewport(Size::new(1024.0, 768.0));
    let report = host.update_layout(&mut tree);

    assert_eq!(
        tree.get(grid).unwrap().render_rect(),
        Rect::new(0.0, 32.0, 1024.0, 736.0)
    );
    assert_eq!(
        tree.get(sidebar).unwrap().render_rect().width,
        200.0
    );
    assert_eq!(
        tree.get(content).unwrap().render_rect(),
        Rect::new(200.0, 32.0, 824.0, 736.0)
    );
    assert!(!report.damage.is_empty());

    // A second frame with nothing changed is a no-op.
    let idle = host.update_layout(&mut tree);
    assert!(idle.damage.is_empty());
    assert_eq!(idle.stats.measure_calls, 0);
}

#[test]
fn hit_test_prefers_topmost_then_deepest() {
    let mut tree = LayoutTree::new();
    let canvas = tree.new_canvas();
    let below = fixed_leaf(&mut tree, 100.0, 100.0);
    let above = fixed_leaf(&mut tree, 100.0, 100.0);
    tree.add_child(canvas, below).unwrap();
    tree.add_child(canvas, above).unwrap();
    tree.set_canvas_anchors(canvas, above, CanvasAnchors::top_left(50.0, 0.0))
        .unwrap();

    let mut host = LayoutHost::new(canvas);
    host.set_viewport(Size::new(300.0, 300.0));
    host.update_layout(&mut tree);

    // Overlap region: the later (topmost) child wins.
    assert_eq!(tree.hit_test(canvas, (60.0, 10.0).into()), Some(above));
    assert_eq!(tree.hit_test(canvas, (10.0, 10.0).into()), Some(below));
    // Outside every child but inside the canvas.
    assert_eq!(tree.hit_test(canvas, (10.0, 200.0).into()), Some(canvas));
    assert_eq!(tree.hit_test(canvas, (500.0, 500.0).into()), None);
}

// ============================================================================
// Properties over randomized trees
// ============================================================================

#[derive(Debug, Clone)]
enum Blueprint {
    Leaf { w: f32, h: f32, margin: f32 },
    Stack(Orientation, f32, Vec<Blueprint>),
    Grid(Vec<Blueprint>),
    Dock(Vec<Blueprint>),
    Wrap(Orientation, Vec<Blueprint>),
    Canvas(Vec<Blueprint>),
}

fn orientation() -> impl Strategy<Value = Orientation> {
    prop_oneof![Just(Orientation::Horizontal), Just(Orientation::Vertical)]
}

fn blueprint() -> impl Strategy<Value = Blueprint> {
    let leaf = (0.0f32..200.0, 0.0f32..200.0, 0.0f32..8.0)
        .prop_map(|(w, h, margin)| Blueprint::Leaf { w, h, margin });
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (orientation(), 0.0f32..10.0, prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(o, s, c)| Blueprint::Stack(o, s, c)),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Blueprint::Grid),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Blueprint::Dock),
            (orientation(), prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(o, c)| Blueprint::Wrap(o, c)),
            prop::collection::vec(inner, 0..4).prop_map(Blueprint::Canvas),
        ]
    })
}

/// Materialize a blueprint, recording every created id.
fn build(tree: &mut LayoutTree, blueprint: &Blueprint, ids: &mut Vec<NodeId>) -> NodeId {
    let id = match blueprint {
        Blueprint::Leaf { w, h, margin } => {
            let (w, h) = (*w, *h);
            let leaf = tree.new_leaf_with(move |_: Size| Size::new(w, h));
            tree.set_margin(leaf, *margin);
            leaf
        }
        Blueprint::Stack(o, spacing, children) => {
            let stack = tree.new_stack(*o);
            tree.set_spacing(stack, *spacing).unwrap();
            for child in children {
                let cid = build(tree, child, ids);
                tree.add_child(stack, cid).unwrap();
            }
            stack
        }
        Blueprint::Grid(children) => {
            let grid = tree.new_grid();
            tree.add_column(grid, Track::auto()).unwrap();
            tree.add_column(grid, Track::star(1.0)).unwrap();
            tree.add_row(grid, Track::star(1.0)).unwrap();
            tree.add_row(grid, Track::auto()).unwrap();
            for (i, child) in children.iter().enumerate() {
                let cid = build(tree, child, ids);
                tree.add_child(grid, cid).unwrap();
                tree.set_grid_placement(grid, cid, GridPlacement::cell(i % 2, i / 2))
                    .unwrap();
            }
            grid
        }
        Blueprint::Dock(children) => {
            let dock = tree.new_dock();
            let edges = [
                DockEdge::Left,
                DockEdge::Top,
                DockEdge::Right,
                DockEdge::Bottom,
            ];
            for (i, child) in children.iter().enumerate() {
                let cid = build(tree, child, ids);
                tree.add_child(dock, cid).unwrap();
                tree.set_dock_edge(dock, cid, edges[i % 4]).unwrap();
            }
            dock
        }
        Blueprint::Wrap(o, children) => {
            let wrap = tree.new_wrap(*o);
            for child in children {
                let cid = build(tree, child, ids);
                tree.add_child(wrap, cid).unwrap();
            }
            wrap
        }
        Blueprint::Canvas(children) => {
            let canvas = tree.new_canvas();
            for (i, child) in children.iter().enumerate() {
                let cid = build(tree, child, ids);
                tree.add_child(canvas, cid).unwrap();
                let offset = (i as f32) * 13.0;
                tree.set_canvas_anchors(canvas, cid, CanvasAnchors::top_left(offset, offset))
                    .unwrap();
            }
            canvas
        }
    };
    ids.push(id);
    id
}

proptest! {
    #[test]
    fn measure_is_idempotent_and_memoized(
        blueprint in blueprint(),
        w in 50.0f32..800.0,
        h in 50.0f32..800.0,
    ) {
        let mut tree = LayoutTree::new();
        let mut ids = Vec::new();
        let root = build(&mut tree, &blueprint, &mut ids);
        let available = Size::new(w, h);

        let mut first_ctx = LayoutContext::new();
        let first = tree.measure(&mut first_ctx, root, available);
        let mut second_ctx = LayoutContext::new();
        let second = tree.measure(&mut second_ctx, root, available);

        prop_assert_eq!(first, second);
        // The clean root short-circuits: all hits, no recomputation.
        prop_assert_eq!(
            second_ctx.stats.measure_cache_hits,
            second_ctx.stats.measure_calls
        );
    }

    #[test]
    fn desired_never_exceeds_finite_available(
        blueprint in blueprint(),
        w in 50.0f32..800.0,
        h in 50.0f32..800.0,
    ) {
        let mut tree = LayoutTree::new();
        let mut ids = Vec::new();
        let root = build(&mut tree, &blueprint, &mut ids);

        let mut ctx = LayoutContext::new();
        let desired = tree.measure(&mut ctx, root, Size::new(w, h));
        prop_assert!(desired.width <= w);
        prop_assert!(desired.height <= h);
    }

    #[test]
    fn every_render_rect_is_finite_and_non_negative(
        blueprint in blueprint(),
        w in 50.0f32..800.0,
        h in 50.0f32..800.0,
    ) {
        let mut tree = LayoutTree::new();
        let mut ids = Vec::new();
        let root = build(&mut tree, &blueprint, &mut ids);

        let mut host = LayoutHost::new(root);
        host.set_viewport(Size::new(w, h));
        host.update_layout(&mut tree);

        for &id in &ids {
            let rect = tree.get(id).unwrap().render_rect();
            prop_assert!(rect.x.is_finite() && rect.y.is_finite(), "{id}: {rect:?}");
            prop_assert!(rect.width >= 0.0 && rect.width.is_finite(), "{id}: {rect:?}");
            prop_assert!(rect.height >= 0.0 && rect.height.is_finite(), "{id}: {rect:?}");
        }
    }

    #[test]
    fn relayout_after_leaf_invalidation_converges(
        blueprint in blueprint(),
        w in 50.0f32..800.0,
        h in 50.0f32..800.0,
    ) {
        let mut tree = LayoutTree::new();
        let mut ids = Vec::new();
        let root = build(&mut tree, &blueprint, &mut ids);

        let mut host = LayoutHost::new(root);
        host.set_viewport(Size::new(w, h));
        host.update_layout(&mut tree);
        let before: Vec<_> = ids
            .iter()
            .map(|&id| tree.get(id).unwrap().render_rect())
            .collect();

        // Invalidate an arbitrary node; nothing actually changed, so the
        // relayout must reproduce the same geometry.
        tree.invalidate_measure(ids[0]);
        host.update_layout(&mut tree);
        let after: Vec<_> = ids
            .iter()
            .map(|&id| tree.get(id).unwrap().render_rect())
            .collect();
        prop_assert_eq!(before, after);
    }
}
