//! altq-layout
//!
//! Grid packing for the switcher overlay. [`pack_grid`] picks a column/row
//! partition for a number of items under a viewport, and [`layout_cells`]
//! turns that partition into cell rectangles. Everything here is pure.
use serde::{Deserialize, Serialize};

/// Weight of each unused grid slot in the score.
const EMPTY_WEIGHT: f64 = 0.08;
/// Weight of each unit of column/row imbalance in the score.
const SHAPE_WEIGHT: f64 = 0.06;

/// A column/row partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Number of columns; at least 1.
    pub columns: usize,
    /// Number of rows; at least 1.
    pub rows: usize,
}

impl GridSize {
    /// Construct a grid size, clamping both dimensions to at least 1.
    #[must_use]
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Row-major `(column, row)` of the item at `index`.
    #[must_use]
    pub fn position(&self, index: usize) -> (usize, usize) {
        let columns = self.columns.max(1);
        (index % columns, index / columns)
    }
}

/// An axis-aligned rectangle in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl Rect {
    /// Construct a rectangle.
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge.
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// Replace non-finite or non-positive dimensions with 1.0.
fn sane(dim: f64) -> f64 {
    if dim.is_finite() && dim > 0.0 { dim } else { 1.0 }
}

/// Score a candidate partition. Lower is better.
///
/// The sum of an aspect penalty (how far cells are from square), an empty
/// penalty per unused slot, and a shape penalty per unit of column/row
/// difference.
#[must_use]
pub fn score(grid: GridSize, item_count: usize, width: f64, height: f64) -> f64 {
    let cell_w = sane(width) / grid.columns as f64;
    let cell_h = sane(height) / grid.rows as f64;
    let aspect = (cell_w - cell_h).abs() / cell_w.max(cell_h);
    let empty = grid.cell_count().saturating_sub(item_count) as f64 * EMPTY_WEIGHT;
    let shape = grid.columns.abs_diff(grid.rows) as f64 * SHAPE_WEIGHT;
    aspect + empty + shape
}

/// Every candidate the scan considers for `item_count` items, with its score,
/// in ascending column order.
pub fn candidates(
    item_count: usize,
    width: f64,
    height: f64,
) -> impl Iterator<Item = (GridSize, f64)> {
    (1..=item_count).map(move |columns| {
        let grid = GridSize::new(columns, item_count.div_ceil(columns));
        (grid, score(grid, item_count, width, height))
    })
}

/// Choose the grid for `item_count` items in a `width` x `height` viewport.
///
/// Zero or one item is 1x1; two items sit side by side when the viewport is
/// wider than tall and stack otherwise. From three items up every column
/// count is scored and the lowest score wins, the first seen on a tie.
#[must_use]
pub fn pack_grid(item_count: usize, width: f64, height: f64) -> GridSize {
    match item_count {
        0 | 1 => GridSize::new(1, 1),
        2 if sane(width) > sane(height) => GridSize::new(2, 1),
        2 => GridSize::new(1, 2),
        _ => {
            let mut best = GridSize::new(item_count, 1);
            let mut best_score = f64::INFINITY;
            for (grid, s) in candidates(item_count, width, height) {
                if s < best_score {
                    best = grid;
                    best_score = s;
                }
            }
            best
        }
    }
}

/// Row-major cell rectangles for `item_count` items packed into `viewport`.
///
/// Cells are uniform, separated from each other and from the viewport edges
/// by `spacing`. Cell sizes never drop below 1.0.
#[must_use]
pub fn layout_cells(item_count: usize, viewport: Rect, spacing: f64) -> Vec<Rect> {
    if item_count == 0 {
        return Vec::new();
    }
    let grid = pack_grid(item_count, viewport.w, viewport.h);
    let spacing = if spacing.is_finite() { spacing.max(0.0) } else { 0.0 };
    let avail_w = (sane(viewport.w) - spacing * (grid.columns + 1) as f64).max(1.0);
    let avail_h = (sane(viewport.h) - spacing * (grid.rows + 1) as f64).max(1.0);
    let cell_w = avail_w / grid.columns as f64;
    let cell_h = avail_h / grid.rows as f64;
    (0..item_count)
        .map(|i| {
            let (col, row) = grid.position(i);
            Rect::new(
                viewport.x + spacing + (cell_w + spacing) * col as f64,
                viewport.y + spacing + (cell_h + spacing) * row as f64,
                cell_w,
                cell_h,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn small_counts_are_special_cased() {
        assert_eq!(pack_grid(0, 1200.0, 800.0), GridSize::new(1, 1));
        assert_eq!(pack_grid(1, 1200.0, 800.0), GridSize::new(1, 1));
        assert_eq!(pack_grid(2, 1000.0, 400.0), GridSize::new(2, 1));
        assert_eq!(pack_grid(2, 400.0, 1000.0), GridSize::new(1, 2));
        // Square viewport stacks.
        assert_eq!(pack_grid(2, 500.0, 500.0), GridSize::new(1, 2));
    }

    #[test]
    fn five_items_in_landscape() {
        let grid = pack_grid(5, 1200.0, 800.0);
        assert_eq!(grid, GridSize::new(3, 2));
        assert!(close(score(grid, 5, 1200.0, 800.0), 0.14));
        // A single row of five loses on aspect.
        let row = GridSize::new(5, 1);
        assert!(close(score(row, 5, 1200.0, 800.0), 0.94));
    }

    #[test]
    fn scan_reports_every_column_count() {
        let all: Vec<GridSize> = candidates(5, 1200.0, 800.0).map(|(g, _)| g).collect();
        assert_eq!(
            all,
            vec![
                GridSize::new(1, 5),
                GridSize::new(2, 3),
                GridSize::new(3, 2),
                GridSize::new(4, 2),
                GridSize::new(5, 1),
            ]
        );
    }

    #[test]
    fn wide_viewport_prefers_more_columns() {
        assert_eq!(pack_grid(4, 1600.0, 900.0), GridSize::new(3, 2));
        assert_eq!(pack_grid(4, 800.0, 800.0), GridSize::new(2, 2));
        assert_eq!(pack_grid(9, 900.0, 900.0), GridSize::new(3, 3));
    }

    #[test]
    fn degenerate_viewport_does_not_produce_nan() {
        for (w, h) in [(0.0, 0.0), (-10.0, 50.0), (f64::NAN, 100.0), (f64::INFINITY, 1.0)] {
            let grid = pack_grid(7, w, h);
            assert!(grid.cell_count() >= 7);
            assert!(score(grid, 7, w, h).is_finite());
        }
    }

    #[test]
    fn position_is_row_major() {
        let grid = GridSize::new(3, 2);
        assert_eq!(grid.position(0), (0, 0));
        assert_eq!(grid.position(2), (2, 0));
        assert_eq!(grid.position(4), (1, 1));
    }

    #[test]
    fn cells_are_spaced_inside_viewport() {
        let viewport = Rect::new(10.0, 20.0, 1200.0, 800.0);
        let cells = layout_cells(5, viewport, 10.0);
        assert_eq!(cells.len(), 5);
        let first = cells[0];
        assert!(close(first.x, 20.0));
        assert!(close(first.y, 30.0));
        assert!(close(first.w, (1200.0 - 40.0) / 3.0));
        assert!(close(first.h, (800.0 - 30.0) / 2.0));
        let fourth = cells[3];
        assert!(close(fourth.x, first.x));
        assert!(close(fourth.y, first.bottom() + 10.0));
        assert!(layout_cells(0, viewport, 10.0).is_empty());
    }

    proptest! {
        #[test]
        fn grid_always_fits(count in 0usize..200, w in 1.0f64..4000.0, h in 1.0f64..4000.0) {
            let grid = pack_grid(count, w, h);
            prop_assert!(grid.cell_count() >= count);
            prop_assert!(grid.columns >= 1 && grid.rows >= 1);
            prop_assert!(grid.columns <= count.max(1));
            // No row is entirely empty.
            prop_assert!(count < 3 || (grid.rows - 1) * grid.columns < count);
        }

        #[test]
        fn winner_has_minimal_score(count in 3usize..80, w in 1.0f64..4000.0, h in 1.0f64..4000.0) {
            let grid = pack_grid(count, w, h);
            let best = score(grid, count, w, h);
            for (_, s) in candidates(count, w, h) {
                prop_assert!(best <= s);
            }
        }

        #[test]
        fn cells_stay_in_viewport(count in 1usize..20, w in 200.0f64..3000.0, h in 200.0f64..3000.0) {
            let viewport = Rect::new(0.0, 0.0, w, h);
            for cell in layout_cells(count, viewport, 8.0) {
                prop_assert!(cell.x >= 0.0 && cell.y >= 0.0);
                prop_assert!(cell.right() <= w + 1e-6);
                prop_assert!(cell.bottom() <= h + 1e-6);
            }
        }
    }
}
