#![forbid(unsafe_code)]

//! Grid container: rows and columns of Auto, Pixel and Star tracks.
//!
//! Each axis resolves independently in three passes: Pixel tracks take
//! their fixed extent, Auto tracks grow to the largest single-span child
//! landing in them, and Star tracks split whatever remains in proportion
//! to their weights. Multi-span children never grow a single track.
//! Clamping a Star track to its min/max does not redistribute the
//! surplus or deficit to the other Star tracks.
//!
//! Track `actual` extents are per-pass scratch; nothing survives beyond
//! the pass that computed it.

use kui_core::{Rect, Size, sanitize_extent};
use smallvec::SmallVec;

use crate::context::LayoutContext;
use crate::measure::clamp_axis;
use crate::node::{NodeId, Track, TrackSizing};
use crate::tree::LayoutTree;

type Tracks = SmallVec<[Track; 8]>;
type Extents = SmallVec<[f32; 8]>;
type Cells = SmallVec<[Cell; 8]>;

/// One child's footprint on one axis.
struct Cell {
    index: usize,
    span: usize,
    extent: f32,
}

/// Track definitions for one axis; a grid with no definitions lays out
/// as a single Auto track.
fn axis_tracks(defs: &[Track]) -> Tracks {
    if defs.is_empty() {
        let mut one = Tracks::new();
        one.push(Track::auto());
        one
    } else {
        defs.iter().copied().collect()
    }
}

fn track_bounds(track: &Track) -> (f32, f32) {
    let min = sanitize_extent(track.min);
    let max = if track.max.is_nan() {
        f32::INFINITY
    } else {
        track.max.max(min)
    };
    (min, max)
}

/// Clamp a child's track index and span to the defined tracks.
fn clamped_cell(index: usize, span: usize, count: usize) -> (usize, usize) {
    let index = index.min(count - 1);
    let span = span.max(1).min(count - index);
    (index, span)
}

/// Resolve one axis's track extents against `extent`.
///
/// When `extent` is unconstrained there is no remaining space for Star
/// tracks to share, so they size from their single-span content maxima
/// the way Auto tracks do.
fn resolve_axis(tracks: &[Track], extent: f32, cells: &[Cell]) -> Extents {
    let mut actual: Extents = tracks.iter().map(|_| 0.0).collect();
    let mut fixed_total = 0.0f32;
    let mut star_total = 0.0f32;
    let stars_from_content = extent.is_infinite();

    for (i, track) in tracks.iter().enumerate() {
        let (min, max) = track_bounds(track);
        match track.sizing {
            TrackSizing::Pixel(value) => {
                actual[i] = clamp_axis(sanitize_extent(value), min, max);
                fixed_total += actual[i];
            }
            TrackSizing::Star(weight) => star_total += sanitize_extent(weight),
            TrackSizing::Auto => {}
        }
    }

    for cell in cells {
        if cell.span != 1 {
            continue;
        }
        let grows = match tracks[cell.index].sizing {
            TrackSizing::Auto => true,
            TrackSizing::Star(_) => stars_from_content,
            TrackSizing::Pixel(_) => false,
        };
        if grows {
            actual[cell.index] = actual[cell.index].max(cell.extent);
        }
    }
    for (i, track) in tracks.iter().enumerate() {
        let content_sized = match track.sizing {
            TrackSizing::Auto => true,
            TrackSizing::Star(_) => stars_from_content,
            TrackSizing::Pixel(_) => false,
        };
        if content_sized {
            let (min, max) = track_bounds(track);
            actual[i] = clamp_axis(actual[i], min, max);
            fixed_total += actual[i];
        }
    }

    if !stars_from_content {
        let remaining = (extent - fixed_total).max(0.0);
        let unit = if star_total > 0.0 {
            remaining / star_total
        } else {
            0.0
        };
        for (i, track) in tracks.iter().enumerate() {
            if let TrackSizing::Star(weight) = track.sizing {
                let (min, max) = track_bounds(track);
                // A clamped Star track keeps its surplus/deficit; the
                // other Star tracks are not re-unitized.
                actual[i] = clamp_axis(unit * sanitize_extent(weight), min, max);
            }
        }
    }

    actual
}

/// Per-axis cells for the visible children, indices and spans already
/// clamped to the defined tracks. Children must have been measured.
fn collect_cells(
    tree: &LayoutTree,
    id: NodeId,
    children: &[NodeId],
    rows: &[Track],
    columns: &[Track],
) -> (Cells, Cells) {
    let mut row_cells = Cells::new();
    let mut col_cells = Cells::new();
    for &child in children {
        let placement = tree.grid_placement(id, child);
        let desired = tree.node(child).desired_size();
        let (row, row_span) = clamped_cell(placement.row, placement.row_span, rows.len());
        let (col, col_span) = clamped_cell(placement.column, placement.column_span, columns.len());
        row_cells.push(Cell {
            index: row,
            span: row_span,
            extent: desired.height,
        });
        col_cells.push(Cell {
            index: col,
            span: col_span,
            extent: desired.width,
        });
    }
    (row_cells, col_cells)
}

pub(crate) fn measure(
    tree: &mut LayoutTree,
    ctx: &mut LayoutContext,
    id: NodeId,
    available: Size,
) -> Size {
    let rows = axis_tracks(tree.rows(id));
    let columns = axis_tracks(tree.columns(id));
    let children = tree.visible_child_ids(id);

    // Children are measured once, up front, with the grid's own
    // available size as the upper bound. Track resolution then works
    // from the cached desired sizes.
    for &child in &children {
        tree.measure(ctx, child, available);
    }

    let (row_cells, col_cells) = collect_cells(tree, id, &children, &rows, &columns);
    let col_sizes = resolve_axis(&columns, available.width, &col_cells);
    let row_sizes = resolve_axis(&rows, available.height, &row_cells);

    Size::new(col_sizes.iter().sum(), row_sizes.iter().sum())
}

pub(crate) fn arrange(tree: &mut LayoutTree, ctx: &mut LayoutContext, id: NodeId, inner: Rect) {
    let rows = axis_tracks(tree.rows(id));
    let columns = axis_tracks(tree.columns(id));
    let children = tree.visible_child_ids(id);

    let (row_cells, col_cells) = collect_cells(tree, id, &children, &rows, &columns);
    let col_sizes = resolve_axis(&columns, inner.width, &col_cells);
    let row_sizes = resolve_axis(&rows, inner.height, &row_cells);

    let col_offsets = prefix_sum(&col_sizes);
    let row_offsets = prefix_sum(&row_sizes);

    for (i, &child) in children.iter().enumerate() {
        let col = &col_cells[i];
        let row = &row_cells[i];
        let cell = Rect::new(
            inner.x + col_offsets[col.index],
            inner.y + row_offsets[row.index],
            col_sizes[col.index..col.index + col.span].iter().sum(),
            row_sizes[row.index..row.index + row.span].iter().sum(),
        );
        tree.arrange(ctx, child, cell);
    }
}

fn prefix_sum(sizes: &[f32]) -> Extents {
    let mut offsets = Extents::with_capacity(sizes.len());
    let mut total = 0.0f32;
    for &size in sizes {
        offsets.push(total);
        total += size;
    }
    offsets
}
