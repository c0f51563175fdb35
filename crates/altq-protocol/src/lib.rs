//! Messages exchanged between the altq server and an overlay renderer.
use std::collections::BTreeMap;

use altq_ids::{DocumentId, WindowId};
use serde::{Deserialize, Serialize};

/// Title shown for documents that report none.
pub const UNTITLED: &str = "Untitled tab";

/// Read-only projection of a live document for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayItem {
    /// Document identifier.
    pub id: DocumentId,
    /// Display title; never empty.
    pub title: String,
    /// Icon location, or empty.
    pub icon_url: String,
    /// Document location, or empty.
    pub url: String,
    /// Whether the document is the active one in its window.
    pub is_active: bool,
}

impl DisplayItem {
    /// Build a display item, filling in defaults for missing fields.
    pub fn new(
        id: DocumentId,
        title: Option<&str>,
        icon_url: Option<&str>,
        url: Option<&str>,
        is_active: bool,
    ) -> Self {
        let title = match title {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => UNTITLED.to_string(),
        };
        Self {
            id,
            title,
            icon_url: icon_url.unwrap_or_default().to_string(),
            url: url.unwrap_or_default().to_string(),
            is_active,
        }
    }
}

/// A cached snapshot as sent to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// Encoded image bytes.
    pub image: Vec<u8>,
    /// Capture time in Unix epoch milliseconds.
    pub captured_at_ms: u64,
}

/// Requests from the renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Request {
    /// Fetch the ordered view for a window.
    GetView {
        /// Target window; `None` when the renderer has no window context.
        window: Option<WindowId>,
    },
    /// Activate a document.
    Activate {
        /// Document to activate.
        document: DocumentId,
    },
}

/// Ordered tabs and their snapshots for one window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewResponse {
    /// False when the window was absent or invalid.
    pub ok: bool,
    /// Tabs in display order.
    pub ordered_tabs: Vec<DisplayItem>,
    /// Snapshots keyed by document, for tabs that have one.
    pub snapshots: BTreeMap<DocumentId, Snapshot>,
}

impl ViewResponse {
    /// The response for an unusable window: not ok, empty collections.
    pub fn rejected() -> Self {
        Self::default()
    }
}

/// Responses to [`Request`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Response {
    /// Reply to [`Request::GetView`].
    View(ViewResponse),
    /// Reply to [`Request::Activate`].
    Ack {
        /// Whether activation succeeded.
        ok: bool,
    },
}

/// One-way signals from the server to renderers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Notification {
    /// Open the overlay, or advance it when already open.
    Trigger,
}

/// IPC-related helpers: channel aliases and message codec.
pub mod ipc {
    use tokio::sync::broadcast;

    use super::Notification;

    /// Sender half of the notification fan-out.
    pub type NotifyTx = broadcast::Sender<Notification>;
    /// Receiver half of the notification fan-out.
    pub type NotifyRx = broadcast::Receiver<Notification>;

    /// Create a notification broadcast channel with room for `capacity`
    /// undelivered messages per receiver.
    pub fn notify_channel(capacity: usize) -> (NotifyTx, NotifyRx) {
        broadcast::channel(capacity.max(1))
    }

    /// Binary codec for requests and responses.
    pub mod codec;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_item_defaults() {
        let item = DisplayItem::new(DocumentId::new(3), None, None, None, false);
        assert_eq!(item.title, UNTITLED);
        assert_eq!(item.icon_url, "");
        assert_eq!(item.url, "");

        let blank = DisplayItem::new(DocumentId::new(3), Some("  "), None, Some("u"), true);
        assert_eq!(blank.title, UNTITLED);
        assert_eq!(blank.url, "u");
        assert!(blank.is_active);
    }

    #[test]
    fn rejected_view_is_empty() {
        let view = ViewResponse::rejected();
        assert!(!view.ok);
        assert!(view.ordered_tabs.is_empty());
        assert!(view.snapshots.is_empty());
    }

    #[tokio::test]
    async fn notifications_fan_out() {
        let (tx, mut a) = ipc::notify_channel(4);
        let mut b = tx.subscribe();
        tx.send(Notification::Trigger).expect("send");
        assert_eq!(a.recv().await.expect("a"), Notification::Trigger);
        assert_eq!(b.recv().await.expect("b"), Notification::Trigger);
    }
}
