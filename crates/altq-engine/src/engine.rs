use std::{
    collections::HashSet,
    future::Future,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use altq_ids::{DocumentId, WindowId};
use altq_store::{CacheState, SnapshotRecord, StateStore};
use tokio::{sync::Mutex, time::timeout};
use tracing::{debug, trace, warn};

use crate::{
    Document, DocumentQuery, EngineCfg, Registry, RegistryError,
    view::{OrderedView, merge_order},
};

/// Recency and eviction engine.
///
/// Owns the in-memory [`CacheState`] behind a single lock. Every mutation runs
/// read-modify-write under that lock, finishes with a reconcile pass against
/// the registry, and then writes the whole state to the store. Failures of
/// the registry or the store are logged and swallowed: the state is a cache
/// and the next event repairs it.
#[derive(Clone)]
pub struct Engine {
    /// Authoritative in-memory state.
    state: Arc<Mutex<CacheState>>,
    /// Durable backing, written after each mutation.
    store: Arc<dyn StateStore>,
    /// Host registry.
    registry: Arc<dyn Registry>,
    /// Tunables.
    cfg: EngineCfg,
}

impl Engine {
    /// Load persisted state from `store` and build an engine around it.
    ///
    /// A failing load starts from empty state.
    pub async fn open(
        store: Arc<dyn StateStore>,
        registry: Arc<dyn Registry>,
        cfg: EngineCfg,
    ) -> Self {
        let state = match store.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "failed to load cache state; starting empty");
                CacheState::default()
            }
        };
        let violations = state.check_invariants();
        if !violations.is_empty() {
            warn!(?violations, "loaded cache state has structural problems");
        }
        debug!(
            windows = state.recency_by_window.len(),
            snapshots = state.snapshots_by_document.len(),
            "engine opened"
        );
        Self {
            state: Arc::new(Mutex::new(state)),
            store,
            registry,
            cfg,
        }
    }

    /// Engine configuration.
    #[must_use]
    pub fn cfg(&self) -> &EngineCfg {
        &self.cfg
    }

    /// Copy of the current state.
    pub async fn state(&self) -> CacheState {
        self.state.lock().await.clone()
    }

    /// Write the current state to the store without changing it.
    pub async fn persist(&self) {
        let state = self.state.lock().await;
        self.save_locked(&state).await;
    }

    /// Move `document` to the front of `window`'s recency list.
    pub async fn touch(&self, window: WindowId, document: DocumentId) {
        let mut state = self.state.lock().await;
        if !state.touch(window, document) {
            trace!(%window, %document, "touch ignored: invalid id");
            return;
        }
        trace!(%window, %document, "touched");
        self.reconcile_locked(&mut state, Some(window)).await;
        self.save_locked(&state).await;
    }

    /// Record a window focus change by touching the window's active document.
    ///
    /// Focus leaving every window carries no recency information and is ignored.
    pub async fn record_focus_change(&self, window: WindowId) {
        if !window.is_valid() {
            trace!(%window, "focus change ignored");
            return;
        }
        let Some(active) = self.active_document(DocumentQuery::active_in(window)).await else {
            debug!(%window, "no active document for focused window");
            return;
        };
        self.touch(window, active.id).await;
    }

    /// Capture `window`'s visible area and store it as `document`'s snapshot.
    ///
    /// A failed capture leaves the state untouched.
    pub async fn capture_snapshot(&self, window: WindowId, document: DocumentId) {
        if !window.is_valid() || !document.is_valid() {
            trace!(%window, %document, "capture ignored: invalid id");
            return;
        }
        let image = match self.call(self.registry.capture_visible(window)).await {
            Ok(image) => image,
            Err(e) => {
                debug!(%window, %document, error = %e, "capture skipped");
                return;
            }
        };
        let record = SnapshotRecord {
            image,
            captured_at_ms: now_ms(),
            owner: window,
        };
        let mut state = self.state.lock().await;
        state.put_snapshot(document, record);
        self.reconcile_locked(&mut state, Some(window)).await;
        self.save_locked(&state).await;
    }

    /// Forget `document` everywhere: every recency list and its snapshot.
    pub async fn remove_document(&self, document: DocumentId) {
        if !document.is_valid() {
            trace!(%document, "remove ignored: invalid id");
            return;
        }
        let mut state = self.state.lock().await;
        let removed = state.remove_document(document);
        trace!(%document, removed, "document removed");
        self.reconcile_locked(&mut state, None).await;
        self.save_locked(&state).await;
    }

    /// Run the maintenance pass on its own and persist the result.
    pub async fn reconcile(&self, focus: Option<WindowId>) {
        let mut state = self.state.lock().await;
        self.reconcile_locked(&mut state, focus).await;
        self.save_locked(&state).await;
    }

    /// Build the display order for `window`.
    ///
    /// Invalid windows and registry failures produce an empty view.
    pub async fn build_view(&self, window: WindowId) -> OrderedView {
        if !window.is_valid() {
            return OrderedView::default();
        }
        let state = self.state.lock().await;
        let live = match self
            .call(self.registry.documents(DocumentQuery::in_window(window)))
            .await
        {
            Ok(live) => live,
            Err(e) => {
                warn!(%window, error = %e, "failed to list documents for view");
                return OrderedView::default();
            }
        };
        let tabs = merge_order(state.recency(window), live);
        let snapshots = tabs
            .iter()
            .filter_map(|d| {
                state
                    .snapshots_by_document
                    .get(&d.id)
                    .map(|s| (d.id, s.clone()))
            })
            .collect();
        trace!(%window, tabs = tabs.len(), "view built");
        OrderedView { tabs, snapshots }
    }

    /// Ask the registry to activate `document`. Returns `true` on success.
    pub async fn activate(&self, document: DocumentId) -> bool {
        if !document.is_valid() {
            return false;
        }
        match self.call(self.registry.activate(document)).await {
            Ok(()) => true,
            Err(e) => {
                debug!(%document, error = %e, "activation failed");
                false
            }
        }
    }

    /// First document matching `query`, if the registry answers.
    pub async fn active_document(&self, query: DocumentQuery) -> Option<Document> {
        match self.call(self.registry.documents(query)).await {
            Ok(docs) => docs.into_iter().find(|d| d.id.is_valid()),
            Err(e) => {
                debug!(?query, error = %e, "document query failed");
                None
            }
        }
    }

    /// Drop state for closed documents and enforce the per-window snapshot cap.
    ///
    /// When the registry fails or reports nothing open, the liveness filter is
    /// skipped so a transient failure cannot wipe the cache; the cap is still
    /// applied.
    async fn reconcile_locked(&self, state: &mut CacheState, focus: Option<WindowId>) {
        match self.call(self.registry.documents(DocumentQuery::all())).await {
            Ok(docs) if !docs.is_empty() => {
                let live: HashSet<DocumentId> = docs.iter().map(|d| d.id).collect();
                let stats = state.retain_live(&live);
                if stats.recency_dropped > 0 || stats.snapshots_dropped > 0 {
                    debug!(
                        recency = stats.recency_dropped,
                        snapshots = stats.snapshots_dropped,
                        "pruned stale entries"
                    );
                }
            }
            Ok(_) => debug!("registry reported no documents; liveness prune skipped"),
            Err(e) => warn!(error = %e, "registry query failed; liveness prune skipped"),
        }
        let evicted = state.enforce_window_cap(focus, self.cfg.max_snapshots_per_window);
        if evicted > 0 {
            debug!(evicted, cap = self.cfg.max_snapshots_per_window, "evicted snapshots");
        }
    }

    /// Persist `state`, logging failures.
    async fn save_locked(&self, state: &CacheState) {
        if let Err(e) = self.store.save(state).await {
            warn!(error = %e, "failed to save cache state");
        }
    }

    /// Bound a registry call by the configured timeout.
    async fn call<T, F>(&self, fut: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, RegistryError>>,
    {
        timeout(self.cfg.registry_timeout, fut)
            .await
            .unwrap_or(Err(RegistryError::Timeout(self.cfg.registry_timeout)))
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
