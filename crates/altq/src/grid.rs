//! `altq grid`: preview the packed grid for an item count and viewport.

use std::fmt::Write as _;

use altq_layout::{candidates, pack_grid};

use crate::error::{Error, Result};

/// Render the chosen grid and the full score table.
pub fn render(count: usize, width: f64, height: f64) -> Result<String> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(Error::Usage(format!(
            "viewport must be positive, got {width}x{height}"
        )));
    }
    let grid = pack_grid(count, width, height);
    let mut out = String::new();
    let _ignored = writeln!(
        out,
        "{count} items in {width}x{height}: {} columns x {} rows",
        grid.columns, grid.rows
    );
    if count < 3 {
        return Ok(out);
    }
    let _ignored = writeln!(out, "{:>7} {:>5} {:>8}", "columns", "rows", "score");
    for (candidate, score) in candidates(count, width, height) {
        let mark = if candidate == grid { " *" } else { "" };
        let _ignored = writeln!(
            out,
            "{:>7} {:>5} {:>8.4}{mark}",
            candidate.columns, candidate.rows, score
        );
    }
    Ok(out)
}
