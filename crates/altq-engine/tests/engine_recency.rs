use std::sync::Arc;

use altq_engine::{Document, Engine, EngineCfg, MemoryRegistry};
use altq_ids::{DocumentId, WindowId};
use altq_store::{CacheState, MemoryStore};

fn w(id: i64) -> WindowId {
    WindowId::new(id)
}

fn d(id: i64) -> DocumentId {
    DocumentId::new(id)
}

async fn engine_with(reg: &MemoryRegistry, store: &MemoryStore) -> Engine {
    Engine::open(
        Arc::new(store.clone()),
        Arc::new(reg.clone()),
        EngineCfg::default(),
    )
    .await
}

fn three_docs() -> MemoryRegistry {
    let reg = MemoryRegistry::new();
    reg.open(Document::new(1, 1).with_title("one"));
    reg.open(Document::new(2, 1).with_title("two"));
    reg.open(Document::new(3, 1).with_title("three").active());
    reg
}

#[tokio::test]
async fn touch_orders_most_recent_first() {
    let reg = three_docs();
    let store = MemoryStore::new();
    let engine = engine_with(&reg, &store).await;

    for id in [1, 2, 3, 2] {
        engine.touch(w(1), d(id)).await;
    }

    let state = engine.state().await;
    assert_eq!(state.recency(w(1)), &[d(2), d(3), d(1)]);
    assert_eq!(store.stored(), state, "every mutation is written through");
}

#[tokio::test]
async fn touch_with_invalid_ids_is_noop() {
    let reg = three_docs();
    let store = MemoryStore::new();
    let engine = engine_with(&reg, &store).await;

    engine.touch(WindowId::NONE, d(1)).await;
    engine.touch(w(0), d(1)).await;
    engine.touch(w(1), d(0)).await;
    engine.touch(w(-5), d(-5)).await;

    assert_eq!(engine.state().await, CacheState::default());
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn repeated_touch_is_idempotent() {
    let reg = three_docs();
    let store = MemoryStore::new();
    let engine = engine_with(&reg, &store).await;

    engine.touch(w(1), d(2)).await;
    let once = engine.state().await;
    for _ in 0..5 {
        engine.touch(w(1), d(2)).await;
    }
    assert_eq!(engine.state().await, once);
    assert_eq!(once.recency(w(1)), &[d(2)]);
}

#[tokio::test]
async fn focus_change_touches_active_document() {
    let reg = three_docs();
    let store = MemoryStore::new();
    let engine = engine_with(&reg, &store).await;

    engine.record_focus_change(w(1)).await;
    assert_eq!(engine.state().await.recency(w(1)), &[d(3)]);
}

#[tokio::test]
async fn focus_loss_does_not_query_registry() {
    let reg = three_docs();
    let store = MemoryStore::new();
    let engine = engine_with(&reg, &store).await;

    let before = reg.calls().len();
    engine.record_focus_change(WindowId::NONE).await;
    engine.record_focus_change(w(-7)).await;
    assert_eq!(reg.calls().len(), before);
    assert_eq!(engine.state().await, CacheState::default());
}

#[tokio::test]
async fn focus_change_survives_registry_failure() {
    let reg = three_docs();
    let store = MemoryStore::new();
    let engine = engine_with(&reg, &store).await;

    reg.set_fail_queries(true);
    engine.record_focus_change(w(1)).await;
    assert_eq!(engine.state().await, CacheState::default());
}

#[tokio::test]
async fn capture_stores_snapshot_owned_by_window() {
    let reg = three_docs();
    let store = MemoryStore::new();
    let engine = engine_with(&reg, &store).await;

    engine.touch(w(1), d(3)).await;
    engine.capture_snapshot(w(1), d(3)).await;

    let state = engine.state().await;
    let record = state.snapshots_by_document.get(&d(3)).expect("snapshot stored");
    assert_eq!(record.owner, w(1));
    assert_eq!(record.image, b"capture:1:3".to_vec());
    assert!(record.captured_at_ms > 0);
}

#[tokio::test]
async fn capture_failure_is_swallowed() {
    let reg = three_docs();
    let store = MemoryStore::new();
    let engine = engine_with(&reg, &store).await;

    engine.touch(w(1), d(3)).await;
    let before = engine.state().await;
    reg.set_restricted(w(1), true);
    engine.capture_snapshot(w(1), d(3)).await;
    assert_eq!(engine.state().await, before);
}

#[tokio::test]
async fn remove_document_strips_every_window() {
    let reg = three_docs();
    reg.open(Document::new(4, 2).active());
    let store = MemoryStore::new();
    let engine = engine_with(&reg, &store).await;

    engine.touch(w(1), d(3)).await;
    engine.capture_snapshot(w(1), d(3)).await;
    // Document dragged to window 2 and activated there before it closes.
    engine.touch(w(2), d(3)).await;

    reg.close(d(3));
    engine.remove_document(d(3)).await;

    let state = engine.state().await;
    assert!(!state.tracked_documents().contains(&d(3)));
    assert!(!engine.build_view(w(1)).await.ids().contains(&d(3)));
    assert!(!engine.build_view(w(2)).await.ids().contains(&d(3)));
}

#[tokio::test]
async fn state_survives_reopen() {
    let reg = three_docs();
    let store = MemoryStore::new();
    {
        let engine = engine_with(&reg, &store).await;
        engine.touch(w(1), d(1)).await;
        engine.touch(w(1), d(2)).await;
    }
    let engine = engine_with(&reg, &store).await;
    assert_eq!(engine.state().await.recency(w(1)), &[d(2), d(1)]);
}

#[tokio::test]
async fn store_failures_do_not_lose_memory_state() {
    let reg = three_docs();
    let store = MemoryStore::new();
    store.set_fail_load(true);
    store.set_fail_save(true);
    let engine = engine_with(&reg, &store).await;

    engine.touch(w(1), d(1)).await;
    assert_eq!(engine.state().await.recency(w(1)), &[d(1)]);
    assert_eq!(store.save_count(), 0);

    store.set_fail_save(false);
    engine.persist().await;
    assert_eq!(store.stored().recency(w(1)), &[d(1)]);
}
