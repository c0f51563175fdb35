//! The cache state document and the structural edits the engine applies to it.
//!
//! Every mutation here preserves two invariants:
//! - a window's recency list never holds the same document twice;
//! - snapshot records are keyed by valid document ids and owned by valid windows.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use altq_ids::{DocumentId, WindowId};
use serde::{Deserialize, Serialize};

/// Cached visual capture of one document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Encoded image bytes as returned by the host capture call.
    pub image: Vec<u8>,
    /// Capture time in milliseconds since the Unix epoch.
    pub captured_at_ms: u64,
    /// Window the document was visible in when captured.
    pub owner: WindowId,
}

/// Counts reported by [`CacheState::retain_live`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// Recency entries dropped because their document is gone.
    pub recency_dropped: usize,
    /// Snapshot records dropped because their document is gone.
    pub snapshots_dropped: usize,
}

/// Structural problem found by [`CacheState::check_invariants`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// A recency list contains the same document more than once.
    DuplicateId {
        /// Window owning the list.
        window: WindowId,
        /// Repeated document.
        document: DocumentId,
    },
    /// A recency list is keyed by an id that cannot name a window.
    InvalidWindow(WindowId),
    /// A snapshot record is keyed by an id that cannot name a document.
    InvalidDocument(DocumentId),
    /// A snapshot record is owned by an id that cannot name a window.
    InvalidOwner {
        /// Document the record belongs to.
        document: DocumentId,
        /// Recorded owner.
        owner: WindowId,
    },
}

/// The whole durable unit: per-window recency lists plus per-document snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheState {
    /// Most-recently-activated-first document ids per window.
    pub recency_by_window: BTreeMap<WindowId, Vec<DocumentId>>,
    /// Snapshot records keyed by document.
    pub snapshots_by_document: BTreeMap<DocumentId, SnapshotRecord>,
}

impl CacheState {
    /// Empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recency list for `window`, empty when the window is unknown.
    #[must_use]
    pub fn recency(&self, window: WindowId) -> &[DocumentId] {
        self.recency_by_window
            .get(&window)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Move `document` to the front of `window`'s recency list.
    ///
    /// Returns `false` without touching the state when either id is invalid.
    pub fn touch(&mut self, window: WindowId, document: DocumentId) -> bool {
        if !window.is_valid() || !document.is_valid() {
            return false;
        }
        let list = self.recency_by_window.entry(window).or_default();
        list.retain(|id| *id != document);
        list.insert(0, document);
        true
    }

    /// Store or replace the snapshot for `document`.
    ///
    /// Returns `false` when the document or owner id is invalid.
    pub fn put_snapshot(&mut self, document: DocumentId, record: SnapshotRecord) -> bool {
        if !document.is_valid() || !record.owner.is_valid() {
            return false;
        }
        self.snapshots_by_document.insert(document, record);
        true
    }

    /// Remove `document` from every recency list and drop its snapshot.
    ///
    /// Returns `true` when anything was removed.
    pub fn remove_document(&mut self, document: DocumentId) -> bool {
        let mut removed = false;
        for list in self.recency_by_window.values_mut() {
            let before = list.len();
            list.retain(|id| *id != document);
            removed |= list.len() != before;
        }
        removed |= self.snapshots_by_document.remove(&document).is_some();
        removed
    }

    /// Keep only documents present in `live`, in recency lists and snapshots alike.
    pub fn retain_live(&mut self, live: &HashSet<DocumentId>) -> PruneStats {
        let mut stats = PruneStats::default();
        for list in self.recency_by_window.values_mut() {
            let before = list.len();
            list.retain(|id| live.contains(id));
            stats.recency_dropped += before - list.len();
        }
        let before = self.snapshots_by_document.len();
        self.snapshots_by_document.retain(|id, _| live.contains(id));
        stats.snapshots_dropped = before - self.snapshots_by_document.len();
        stats
    }

    /// Evict snapshots that fall outside each window's keep-set.
    ///
    /// The keep-set for a window is the first `cap` ids of its recency list.
    /// Every window with a recency list is visited, plus `focus` when valid.
    /// Windows whose list ends up empty are dropped afterwards. Returns the
    /// number of snapshot records evicted.
    pub fn enforce_window_cap(&mut self, focus: Option<WindowId>, cap: usize) -> usize {
        let mut windows: BTreeSet<WindowId> = self.recency_by_window.keys().copied().collect();
        if let Some(focus) = focus
            && focus.is_valid()
        {
            windows.insert(focus);
        }

        let before = self.snapshots_by_document.len();
        for window in windows {
            let keep: HashSet<DocumentId> = self.recency(window).iter().take(cap).copied().collect();
            self.snapshots_by_document
                .retain(|id, record| record.owner != window || keep.contains(id));
        }
        self.recency_by_window.retain(|_, list| !list.is_empty());
        before - self.snapshots_by_document.len()
    }

    /// Number of snapshot records owned by `window`.
    #[must_use]
    pub fn snapshot_count_for(&self, window: WindowId) -> usize {
        self.snapshots_by_document
            .values()
            .filter(|record| record.owner == window)
            .count()
    }

    /// All document ids referenced anywhere in the state.
    #[must_use]
    pub fn tracked_documents(&self) -> BTreeSet<DocumentId> {
        self.recency_by_window
            .values()
            .flatten()
            .copied()
            .chain(self.snapshots_by_document.keys().copied())
            .collect()
    }

    /// Report structural problems. An engine that upholds its invariants never
    /// produces any; a non-empty result indicates a bug or a hand-edited file.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        for (window, list) in &self.recency_by_window {
            if !window.is_valid() {
                out.push(Violation::InvalidWindow(*window));
            }
            let mut seen = HashSet::new();
            for document in list {
                if !seen.insert(*document) {
                    out.push(Violation::DuplicateId {
                        window: *window,
                        document: *document,
                    });
                }
            }
        }
        for (document, record) in &self.snapshots_by_document {
            if !document.is_valid() {
                out.push(Violation::InvalidDocument(*document));
            }
            if !record.owner.is_valid() {
                out.push(Violation::InvalidOwner {
                    document: *document,
                    owner: record.owner,
                });
            }
        }
        out
    }
}
