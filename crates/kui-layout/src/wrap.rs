#![forbid(unsafe_code)]

//! Wrap container: flow layout that breaks into lines.
//!
//! Children pack greedily along the flow axis and spill onto a new line
//! when the next slot would overflow the available extent. Measure and
//! arrange share one line builder so both passes break in exactly the
//! same places. `item_width`/`item_height` override every child's slot
//! uniformly when set.

use kui_core::{Rect, Size};
use smallvec::SmallVec;

use crate::context::LayoutContext;
use crate::node::NodeId;
use crate::tree::LayoutTree;
use crate::Orientation;

/// One packed line: the children at `[start, end)` of the visible list,
/// their summed main extent, and the line's cross thickness.
struct Line {
    start: usize,
    end: usize,
    used: f32,
    thickness: f32,
}

/// Greedily pack `slots` into lines bounded by `capacity` along the
/// flow axis. A line breaks when the next slot would overflow and the
/// line already holds at least one child; an unconstrained capacity
/// never breaks.
fn build_lines(slots: &[Size], orientation: Orientation, capacity: f32) -> SmallVec<[Line; 4]> {
    let mut lines: SmallVec<[Line; 4]> = SmallVec::new();
    let mut start = 0usize;
    let mut used = 0.0f32;
    let mut thickness = 0.0f32;

    for (i, &slot) in slots.iter().enumerate() {
        let main = orientation.main_of(slot);
        let cross = orientation.cross_of(slot);
        if i > start && used + main > capacity {
            lines.push(Line {
                start,
                end: i,
                used,
                thickness,
            });
            start = i;
            used = 0.0;
            thickness = 0.0;
        }
        used += main;
        thickness = thickness.max(cross);
    }
    if start < slots.len() {
        lines.push(Line {
            start,
            end: slots.len(),
            used,
            thickness,
        });
    }
    lines
}

/// Slot sizes for the visible children: each child's desired size with
/// the uniform overrides applied. Children must have been measured.
fn collect_slots(tree: &LayoutTree, children: &[NodeId], overrides: (Option<f32>, Option<f32>)) -> SmallVec<[Size; 8]> {
    let (item_width, item_height) = overrides;
    children
        .iter()
        .map(|&child| {
            let desired = tree.node(child).desired_size();
            Size::new(
                item_width.unwrap_or(desired.width),
                item_height.unwrap_or(desired.height),
            )
        })
        .collect()
}

pub(crate) fn measure(
    tree: &mut LayoutTree,
    ctx: &mut LayoutContext,
    id: NodeId,
    available: Size,
) -> Size {
    let (orientation, item_width, item_height) = tree.wrap_spec(id);
    let children = tree.visible_child_ids(id);

    let child_available = Size::new(
        item_width.unwrap_or(available.width),
        item_height.unwrap_or(available.height),
    );
    for &child in &children {
        tree.measure(ctx, child, child_available);
    }

    let slots = collect_slots(tree, &children, (item_width, item_height));
    let lines = build_lines(&slots, orientation, orientation.main_of(available));

    let mut main = 0.0f32;
    let mut cross = 0.0f32;
    for line in &lines {
        main = main.max(line.used);
        cross += line.thickness;
    }
    orientation.pack(main, cross)
}

pub(crate) fn arrange(tree: &mut LayoutTree, ctx: &mut LayoutContext, id: NodeId, inner: Rect) {
    let (orientation, item_width, item_height) = tree.wrap_spec(id);
    let children = tree.visible_child_ids(id);

    let slots = collect_slots(tree, &children, (item_width, item_height));
    let lines = build_lines(&slots, orientation, orientation.main_of(inner.size()));

    let mut cross_offset = 0.0f32;
    for line in &lines {
        let mut main_offset = 0.0f32;
        for i in line.start..line.end {
            let slot = slots[i];
            let main = orientation.main_of(slot);
            let rect = match orientation {
                Orientation::Horizontal => Rect::new(
                    inner.x + main_offset,
                    inner.y + cross_offset,
                    main,
                    line.thickness,
                ),
                Orientation::Vertical => Rect::new(
                    inner.x + cross_offset,
                    inner.y + main_offset,
                    line.thickness,
                    main,
                ),
            };
            tree.arrange(ctx, children[i], rect);
            main_offset += main;
        }
        cross_offset += line.thickness;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LayoutContext;

    fn fixed_leaf(tree: &mut LayoutTree, w: f32, h: f32) -> NodeId {
        tree.new_leaf_with(move |_: Size| Size::new(w, h))
    }

    fn pass(tree: &mut LayoutTree, root: NodeId, viewport: Size) {
        let mut ctx = LayoutContext::new();
        tree.measure(&mut ctx, root, viewport);
        tree.arrange(&mut ctx, root, Rect::from_size(viewport));
    }

    #[test]
    fn five_children_in_250_pack_two_per_line() {
        let mut tree = LayoutTree::new();
        let wrap = tree.new_wrap(Orientation::Horizontal);
        let children: Vec<_> = (0..5)
            .map(|_| {
                let leaf = fixed_leaf(&mut tree, 100.0, 30.0);
                tree.add_child(wrap, leaf).unwrap();
                leaf
            })
            .collect();

        let mut ctx = LayoutContext::new();
        let viewport = Size::new(250.0, 500.0);
        let desired = tree.measure(&mut ctx, wrap, viewport);
        // Three lines of thickness 30; widest line uses 200.
        assert_eq!(desired, Size::new(200.0, 90.0));

        tree.arrange(&mut ctx, wrap, Rect::from_size(viewport));
        // Child 2 starts the second line.
        assert_eq!(
            tree.get(children[2]).unwrap().render_rect(),
            Rect::new(0.0, 30.0, 100.0, 30.0)
        );
        assert_eq!(
            tree.get(children[4]).unwrap().render_rect(),
            Rect::new(0.0, 60.0, 100.0, 30.0)
        );
    }

    #[test]
    fn line_thickness_is_the_tallest_child() {
        let mut tree = LayoutTree::new();
        let wrap = tree.new_wrap(Orientation::Horizontal);
        let short = fixed_leaf(&mut tree, 50.0, 10.0);
        let tall = fixed_leaf(&mut tree, 50.0, 40.0);
        let next = fixed_leaf(&mut tree, 80.0, 10.0);
        for child in [short, tall, next] {
            tree.add_child(wrap, child).unwrap();
        }

        pass(&mut tree, wrap, Size::new(120.0, 500.0));
        // First line holds short+tall (thickness 40), next wraps under it.
        assert_eq!(tree.get(next).unwrap().render_rect().y, 40.0);
    }

    #[test]
    fn oversized_child_gets_a_line_of_its_own() {
        let mut tree = LayoutTree::new();
        let wrap = tree.new_wrap(Orientation::Horizontal);
        let big = fixed_leaf(&mut tree, 500.0, 20.0);
        let small = fixed_leaf(&mut tree, 50.0, 20.0);
        tree.add_child(wrap, big).unwrap();
        tree.add_child(wrap, small).unwrap();

        pass(&mut tree, wrap, Size::new(200.0, 500.0));
        // The oversized child does not break before itself.
        assert_eq!(tree.get(big).unwrap().render_rect().y, 0.0);
        assert_eq!(tree.get(small).unwrap().render_rect().y, 20.0);
    }

    #[test]
    fn unconstrained_extent_never_breaks() {
        let mut tree = LayoutTree::new();
        let wrap = tree.new_wrap(Orientation::Horizontal);
        for _ in 0..4 {
            let leaf = fixed_leaf(&mut tree, 100.0, 10.0);
            tree.add_child(wrap, leaf).unwrap();
        }
        let mut ctx = LayoutContext::new();
        let desired = tree.measure(&mut ctx, wrap, Size::new(f32::INFINITY, 100.0));
        assert_eq!(desired, Size::new(400.0, 10.0));
    }

    #[test]
    fn item_overrides_replace_child_sizes() {
        let mut tree = LayoutTree::new();
        let wrap = tree.new_wrap(Orientation::Horizontal);
        tree.set_item_width(wrap, Some(60.0)).unwrap();
        tree.set_item_height(wrap, Some(25.0)).unwrap();
        for _ in 0..3 {
            let leaf = fixed_leaf(&mut tree, 10.0, 10.0);
            tree.add_child(wrap, leaf).unwrap();
        }
        let mut ctx = LayoutContext::new();
        let desired = tree.measure(&mut ctx, wrap, Size::new(130.0, 500.0));
        // Two 60-wide slots per line, third wraps: 120 x 50.
        assert_eq!(desired, Size::new(120.0, 50.0));
    }

    #[test]
    fn vertical_wrap_flows_down_then_right() {
        let mut tree = LayoutTree::new();
        let wrap = tree.new_wrap(Orientation::Vertical);
        let children: Vec<_> = (0..3)
            .map(|_| {
                let leaf = fixed_leaf(&mut tree, 40.0, 50.0);
                tree.add_child(wrap, leaf).unwrap();
                leaf
            })
            .collect();

        pass(&mut tree, wrap, Size::new(500.0, 110.0));
        // Two per column, third starts the second column.
        assert_eq!(
            tree.get(children[2]).unwrap().render_rect(),
            Rect::new(40.0, 0.0, 40.0, 50.0)
        );
    }
}
