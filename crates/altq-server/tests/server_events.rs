use std::time::Instant;

use altq_engine::Document;
use altq_ids::{DocumentId, WindowId};
use altq_layout::Rect;
use altq_overlay::{OverlayEvent, OverlayKey, OverlaySession};
use altq_protocol::Notification;
use altq_server::{
    HostEvent, Settings, TOGGLE_SWITCHER,
    test_support::{Fixture, recv_notification},
    view_source,
};
use altq_store::MemoryStore;

fn d(id: i64) -> DocumentId {
    DocumentId::new(id)
}

fn w(id: i64) -> WindowId {
    WindowId::new(id)
}

fn toggle() -> HostEvent {
    HostEvent::Command {
        name: TOGGLE_SWITCHER.into(),
    }
}

#[tokio::test]
async fn activation_touches_and_captures() {
    let fx = Fixture::new(&Settings::default()).await;
    fx.registry.open(Document::new(1, 1).active());
    fx.server
        .apply(HostEvent::DocumentActivated {
            window: w(1),
            document: d(1),
        })
        .await;

    let state = fx.engine.state().await;
    assert_eq!(state.recency(w(1)), &[d(1)]);
    assert!(state.snapshots_by_document.contains_key(&d(1)));
    assert_eq!(fx.store.stored(), state);
}

#[tokio::test]
async fn capture_can_be_disabled() {
    let settings = Settings {
        capture_on_activate: false,
        ..Settings::default()
    };
    let fx = Fixture::new(&settings).await;
    fx.registry.open(Document::new(1, 1).active());
    fx.server
        .apply(HostEvent::DocumentActivated {
            window: w(1),
            document: d(1),
        })
        .await;

    assert!(fx.engine.state().await.snapshots_by_document.is_empty());
    assert!(!fx.registry.calls_contains("capture"));
}

#[tokio::test]
async fn removal_forgets_the_document() {
    let fx = Fixture::new(&Settings::default()).await;
    fx.registry.open(Document::new(1, 1));
    fx.registry.open(Document::new(2, 1).active());
    for id in [1, 2] {
        fx.registry.set_active(d(id));
        fx.server
            .apply(HostEvent::DocumentActivated {
                window: w(1),
                document: d(id),
            })
            .await;
    }

    fx.registry.close(d(2));
    fx.server
        .apply(HostEvent::DocumentRemoved { document: d(2) })
        .await;

    let state = fx.engine.state().await;
    assert!(!state.tracked_documents().contains(&d(2)));
    assert_eq!(state.recency(w(1)), &[d(1)]);
}

#[tokio::test]
async fn focus_events_touch_the_active_document() {
    let fx = Fixture::new(&Settings::default()).await;
    fx.registry.open(Document::new(1, 1).active());
    fx.registry.open(Document::new(5, 2).active());

    fx.server.apply(HostEvent::FocusChanged { window: w(2) }).await;
    fx.server
        .apply(HostEvent::FocusChanged {
            window: WindowId::NONE,
        })
        .await;

    let state = fx.engine.state().await;
    assert_eq!(state.recency(w(2)), &[d(5)]);
    assert!(state.recency(w(1)).is_empty());
}

#[tokio::test]
async fn toggle_broadcasts_trigger_when_a_document_is_focused() {
    let fx = Fixture::new(&Settings::default()).await;
    let mut rx = fx.server.subscribe();

    // Nothing focused yet: no trigger.
    fx.server.apply(toggle()).await;
    assert_eq!(recv_notification(&mut rx, 20).await, None);

    fx.registry.open(Document::new(1, 1).active());
    fx.registry.focus_window(w(1));
    fx.server.apply(toggle()).await;
    assert_eq!(recv_notification(&mut rx, 200).await, Some(Notification::Trigger));

    fx.server
        .apply(HostEvent::Command {
            name: "something-else".into(),
        })
        .await;
    assert_eq!(recv_notification(&mut rx, 20).await, None);
}

#[tokio::test]
async fn installed_writes_loaded_state_back() {
    let store = MemoryStore::new();
    let fx = Fixture::with(Default::default(), store.clone(), &Settings::default()).await;
    assert_eq!(store.save_count(), 0);
    fx.server.apply(HostEvent::Installed).await;
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn overlay_session_drives_the_server() {
    let fx = Fixture::new(&Settings::default()).await;
    for id in 1..=3 {
        fx.registry.open(Document::new(id, 1).active());
        fx.server
            .apply(HostEvent::DocumentActivated {
                window: w(1),
                document: d(id),
            })
            .await;
    }

    let mut overlay = OverlaySession::new(
        view_source(&fx.server),
        Some(w(1)),
        Settings::default().overlay_cfg(),
    );
    let viewport = Rect::new(0.0, 0.0, 1200.0, 800.0);
    assert_eq!(overlay.trigger(Instant::now(), viewport).await, OverlayEvent::Update);
    assert_eq!(overlay.selected_item().map(|t| t.id), Some(d(2)));
    assert!(overlay.snapshot(d(2)).is_some());

    let ev = overlay.handle_key(OverlayKey::Enter).await;
    assert_eq!(ev, OverlayEvent::Activated(d(2)));
    assert!(
        fx.registry
            .documents_now()
            .iter()
            .any(|doc| doc.id == d(2) && doc.active)
    );
}
