//! `altq show`: summarise a stored cache state.

use std::{collections::BTreeMap, fmt::Write as _, path::Path};

use altq_ids::WindowId;
use altq_store::{CacheState, FileStore, StateStore};

use crate::error::{Error, Result};

/// Load the state stored at `path`. Unlike the engine, a missing file is an error.
pub async fn load(path: &Path) -> Result<CacheState> {
    if !path.exists() {
        return Err(Error::Missing(path.to_path_buf()));
    }
    Ok(FileStore::new(path).load().await?)
}

/// Human-readable summary: per-window recency and snapshot counts, then the
/// invariant check.
pub fn render(state: &CacheState, cap: usize) -> String {
    let mut out = String::new();
    let _ignored = writeln!(
        out,
        "{} windows, {} snapshots",
        state.recency_by_window.len(),
        state.snapshots_by_document.len()
    );

    let mut owners: BTreeMap<WindowId, usize> = BTreeMap::new();
    for record in state.snapshots_by_document.values() {
        *owners.entry(record.owner).or_default() += 1;
    }

    for (window, list) in &state.recency_by_window {
        let count = owners.remove(window).unwrap_or(0);
        let over = if count > cap { " (over cap)" } else { "" };
        let _ignored = writeln!(
            out,
            "window {window}: {} tabs, {count}/{cap} snapshots{over}",
            list.len()
        );
        let ids: Vec<String> = list.iter().map(ToString::to_string).collect();
        let _ignored = writeln!(out, "  recency: {}", ids.join(" "));
    }
    for (window, count) in owners {
        let _ignored = writeln!(out, "window {window}: no recency list, {count} snapshots");
    }

    let violations = state.check_invariants();
    if violations.is_empty() {
        let _ignored = writeln!(out, "invariants: ok");
    } else {
        let _ignored = writeln!(out, "invariants: {} problems", violations.len());
        for v in violations {
            let _ignored = writeln!(out, "  {v:?}");
        }
    }
    out
}
