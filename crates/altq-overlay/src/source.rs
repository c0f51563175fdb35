use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use altq_ids::{DocumentId, WindowId};
use altq_protocol::ViewResponse;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Where an overlay session gets its data and sends activations.
#[async_trait]
pub trait ViewSource: Send + Sync {
    /// Fetch the ordered view for `window`.
    async fn get_view(&self, window: Option<WindowId>) -> ViewResponse;

    /// Activate `document`. Returns `true` on success.
    async fn activate(&self, document: DocumentId) -> bool;
}

/// A [`ViewSource`] serving a fixed view, recording activations.
#[derive(Debug, Default)]
pub struct StaticSource {
    /// View returned for every request.
    view: Mutex<ViewResponse>,
    /// Documents passed to `activate`, in order.
    activations: Mutex<Vec<DocumentId>>,
    /// Number of `get_view` calls.
    requests: AtomicUsize,
    /// When set, activation reports failure.
    fail_activate: AtomicBool,
}

impl StaticSource {
    /// A source serving `view`.
    pub fn new(view: ViewResponse) -> Self {
        Self {
            view: Mutex::new(view),
            ..Self::default()
        }
    }

    /// Replace the served view.
    pub fn set_view(&self, view: ViewResponse) {
        *self.view.lock() = view;
    }

    /// Make activation fail or succeed.
    pub fn set_fail_activate(&self, fail: bool) {
        self.fail_activate.store(fail, Ordering::SeqCst);
    }

    /// Documents activated so far.
    pub fn activations(&self) -> Vec<DocumentId> {
        self.activations.lock().clone()
    }

    /// Number of views served so far.
    pub fn view_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ViewSource for StaticSource {
    async fn get_view(&self, _window: Option<WindowId>) -> ViewResponse {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.view.lock().clone()
    }

    async fn activate(&self, document: DocumentId) -> bool {
        self.activations.lock().push(document);
        !self.fail_activate.load(Ordering::SeqCst)
    }
}
