//! Boundary to the host's live document/window registry.

use std::{collections::HashSet, sync::Arc, time::Duration};

use altq_ids::{DocumentId, WindowId};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

/// Failures reported by a [`Registry`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The host could not answer the request.
    #[error("registry unavailable: {0}")]
    Unavailable(String),
    /// The requested document is not open.
    #[error("document {0} not found")]
    NotFound(DocumentId),
    /// The host refused to capture the window (restricted page, race, ...).
    #[error("capture of window {window} failed: {reason}")]
    CaptureFailed {
        /// Window whose capture was requested.
        window: WindowId,
        /// Host-provided reason.
        reason: String,
    },
    /// The call did not complete within the configured bound.
    #[error("registry call timed out after {0:?}")]
    Timeout(Duration),
}

/// A live document as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Document identifier.
    pub id: DocumentId,
    /// Window currently holding the document.
    pub window: WindowId,
    /// Page title, if the host knows one.
    pub title: Option<String>,
    /// Icon reference, if any.
    pub icon_url: Option<String>,
    /// Current URL, if visible to us.
    pub url: Option<String>,
    /// True when this is the window's active document.
    pub active: bool,
}

impl Document {
    /// Inactive, untitled document in `window`.
    pub fn new(id: impl Into<DocumentId>, window: impl Into<WindowId>) -> Self {
        Self {
            id: id.into(),
            window: window.into(),
            title: None,
            icon_url: None,
            url: None,
            active: false,
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the icon reference.
    #[must_use]
    pub fn with_icon(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = Some(icon_url.into());
        self
    }

    /// Mark as the active document of its window.
    #[must_use]
    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }
}

/// Filter for [`Registry::documents`]. Unset fields match everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Restrict to one window.
    pub window: Option<WindowId>,
    /// Restrict by active flag.
    pub active: Option<bool>,
    /// Restrict to the window that most recently had focus.
    pub last_focused_window: bool,
}

impl DocumentQuery {
    /// Every open document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Every document in `window`, in host order.
    #[must_use]
    pub fn in_window(window: WindowId) -> Self {
        Self {
            window: Some(window),
            ..Self::default()
        }
    }

    /// The active document of `window`.
    #[must_use]
    pub fn active_in(window: WindowId) -> Self {
        Self {
            window: Some(window),
            active: Some(true),
            ..Self::default()
        }
    }

    /// The active document of the last focused window.
    #[must_use]
    pub fn active_in_last_focused() -> Self {
        Self {
            active: Some(true),
            last_focused_window: true,
            ..Self::default()
        }
    }
}

/// Host operations the engine depends on. Every call may fail or be slow.
#[async_trait]
pub trait Registry: Send + Sync {
    /// List open documents matching `query`, in host order.
    async fn documents(&self, query: DocumentQuery) -> Result<Vec<Document>, RegistryError>;

    /// Capture the visible area of `window` as encoded image bytes.
    async fn capture_visible(&self, window: WindowId) -> Result<Vec<u8>, RegistryError>;

    /// Bring `document` to the front of its window.
    async fn activate(&self, document: DocumentId) -> Result<(), RegistryError>;
}

/// Mutable contents of a [`MemoryRegistry`].
#[derive(Default)]
struct RegistryState {
    /// Open documents in host order.
    documents: Vec<Document>,
    /// Window that most recently had focus.
    last_focused: Option<WindowId>,
    /// Windows whose capture always fails.
    restricted: HashSet<WindowId>,
    /// When set, every query fails.
    fail_queries: bool,
}

/// Deterministic in-memory [`Registry`] for tests and scripted replays.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    /// Registry contents.
    state: Arc<RwLock<RegistryState>>,
    /// Log of calls received, for assertions.
    calls: Arc<Mutex<Vec<String>>>,
}

impl MemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the open documents wholesale.
    pub fn set_documents(&self, documents: Vec<Document>) {
        self.state.write().documents = documents;
    }

    /// Open a document at the end of its window. Activates it when `doc.active` is set.
    pub fn open(&self, doc: Document) {
        let mut state = self.state.write();
        if doc.active {
            for other in state.documents.iter_mut().filter(|d| d.window == doc.window) {
                other.active = false;
            }
        }
        state.documents.retain(|d| d.id != doc.id);
        state.documents.push(doc);
    }

    /// Close a document. Returns `true` when it was open.
    pub fn close(&self, id: DocumentId) -> bool {
        let mut state = self.state.write();
        let before = state.documents.len();
        state.documents.retain(|d| d.id != id);
        state.documents.len() != before
    }

    /// Close every document in `window`.
    pub fn close_window(&self, window: WindowId) {
        let mut state = self.state.write();
        state.documents.retain(|d| d.window != window);
        if state.last_focused == Some(window) {
            state.last_focused = None;
        }
    }

    /// Make `id` the active document of its window. Returns `false` when not open.
    pub fn set_active(&self, id: DocumentId) -> bool {
        let mut state = self.state.write();
        let Some(window) = state.documents.iter().find(|d| d.id == id).map(|d| d.window) else {
            return false;
        };
        for doc in state.documents.iter_mut().filter(|d| d.window == window) {
            doc.active = doc.id == id;
        }
        true
    }

    /// Record `window` as the last focused window.
    pub fn focus_window(&self, window: WindowId) {
        self.state.write().last_focused = Some(window);
    }

    /// Make captures of `window` fail (or succeed again).
    pub fn set_restricted(&self, window: WindowId, restricted: bool) {
        let mut state = self.state.write();
        if restricted {
            state.restricted.insert(window);
        } else {
            state.restricted.remove(&window);
        }
    }

    /// Make every query fail (or succeed again).
    pub fn set_fail_queries(&self, fail: bool) {
        self.state.write().fail_queries = fail;
    }

    /// Snapshot of the open documents.
    pub fn documents_now(&self) -> Vec<Document> {
        self.state.read().documents.clone()
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// True when any recorded call starts with `prefix`.
    pub fn calls_contains(&self, prefix: &str) -> bool {
        self.calls.lock().iter().any(|c| c.starts_with(prefix))
    }

    /// Append to the call log.
    fn note(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn documents(&self, query: DocumentQuery) -> Result<Vec<Document>, RegistryError> {
        self.note(format!("documents {query:?}"));
        let state = self.state.read();
        if state.fail_queries {
            return Err(RegistryError::Unavailable("queries disabled".into()));
        }
        let focused = state.last_focused;
        Ok(state
            .documents
            .iter()
            .filter(|d| query.window.is_none_or(|w| d.window == w))
            .filter(|d| query.active.is_none_or(|a| d.active == a))
            .filter(|d| !query.last_focused_window || Some(d.window) == focused)
            .cloned()
            .collect())
    }

    async fn capture_visible(&self, window: WindowId) -> Result<Vec<u8>, RegistryError> {
        self.note(format!("capture {window}"));
        let state = self.state.read();
        if state.restricted.contains(&window) {
            return Err(RegistryError::CaptureFailed {
                window,
                reason: "restricted".into(),
            });
        }
        let active = state
            .documents
            .iter()
            .find(|d| d.window == window && d.active)
            .ok_or_else(|| RegistryError::CaptureFailed {
                window,
                reason: "nothing visible".into(),
            })?;
        Ok(format!("capture:{window}:{}", active.id).into_bytes())
    }

    async fn activate(&self, document: DocumentId) -> Result<(), RegistryError> {
        self.note(format!("activate {document}"));
        let window = self
            .state
            .read()
            .documents
            .iter()
            .find(|d| d.id == document)
            .map(|d| d.window)
            .ok_or(RegistryError::NotFound(document))?;
        self.set_active(document);
        self.focus_window(window);
        Ok(())
    }
}
