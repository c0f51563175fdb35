//! Ordered view reconciliation: merging stored recency with the live document list.

use std::collections::{BTreeMap, HashMap};

use altq_ids::DocumentId;
use altq_store::SnapshotRecord;

use crate::Document;

/// Display order for one window plus the snapshots available for it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderedView {
    /// Live documents, recency-known first, then the rest in host order.
    pub tabs: Vec<Document>,
    /// Stored snapshots for documents in `tabs`.
    pub snapshots: BTreeMap<DocumentId, SnapshotRecord>,
}

impl OrderedView {
    /// True when the view has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Document ids in display order.
    #[must_use]
    pub fn ids(&self) -> Vec<DocumentId> {
        self.tabs.iter().map(|d| d.id).collect()
    }
}

/// Merge a stored recency list with the host's live list.
///
/// Phase one walks `recency` and emits every id still live. Phase two appends
/// the remaining live documents in the order the host returned them. The
/// result holds each live document exactly once; a document the host lists
/// twice is emitted at its first position.
pub fn merge_order(recency: &[DocumentId], live: Vec<Document>) -> Vec<Document> {
    let mut host_order = Vec::with_capacity(live.len());
    let mut remaining: HashMap<DocumentId, Document> = HashMap::with_capacity(live.len());
    for doc in live {
        if !remaining.contains_key(&doc.id) {
            host_order.push(doc.id);
            remaining.insert(doc.id, doc);
        }
    }

    let mut out = Vec::with_capacity(remaining.len());
    for id in recency {
        if let Some(doc) = remaining.remove(id) {
            out.push(doc);
        }
    }
    for id in host_order {
        if let Some(doc) = remaining.remove(&id) {
            out.push(doc);
        }
    }
    out
}
