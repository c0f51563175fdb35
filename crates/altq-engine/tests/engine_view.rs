use std::sync::Arc;

use altq_engine::{Document, Engine, EngineCfg, MemoryRegistry};
use altq_ids::{DocumentId, WindowId};
use altq_store::MemoryStore;

fn w(id: i64) -> WindowId {
    WindowId::new(id)
}

fn d(id: i64) -> DocumentId {
    DocumentId::new(id)
}

fn ids(raw: &[i64]) -> Vec<DocumentId> {
    raw.iter().copied().map(DocumentId::new).collect()
}

async fn engine_with(reg: &MemoryRegistry) -> Engine {
    Engine::open(
        Arc::new(MemoryStore::new()),
        Arc::new(reg.clone()),
        EngineCfg::default(),
    )
    .await
}

#[tokio::test]
async fn recency_leads_and_new_tabs_trail_in_host_order() {
    let reg = MemoryRegistry::new();
    for id in 1..=5 {
        reg.open(Document::new(id, 1));
    }
    reg.open(Document::new(9, 2));
    let engine = engine_with(&reg).await;

    engine.touch(w(1), d(2)).await;
    engine.touch(w(1), d(4)).await;
    engine.touch(w(2), d(9)).await;

    let view = engine.build_view(w(1)).await;
    assert_eq!(view.ids(), ids(&[4, 2, 1, 3, 5]));

    // A freshly opened, never activated tab trails.
    reg.open(Document::new(6, 1));
    assert_eq!(engine.build_view(w(1)).await.ids(), ids(&[4, 2, 1, 3, 5, 6]));
}

#[tokio::test]
async fn view_only_contains_live_documents() {
    let reg = MemoryRegistry::new();
    for id in 1..=3 {
        reg.open(Document::new(id, 1));
    }
    let engine = engine_with(&reg).await;
    engine.touch(w(1), d(3)).await;
    engine.touch(w(1), d(1)).await;

    // Closed without a removal event: recency still mentions it.
    reg.close(d(3));
    let view = engine.build_view(w(1)).await;
    assert_eq!(view.ids(), ids(&[1, 2]));
}

#[tokio::test]
async fn invalid_window_yields_empty_view() {
    let reg = MemoryRegistry::new();
    reg.open(Document::new(1, 1));
    let engine = engine_with(&reg).await;
    assert!(engine.build_view(WindowId::NONE).await.is_empty());
    assert!(engine.build_view(w(0)).await.is_empty());
}

#[tokio::test]
async fn registry_failure_yields_empty_view() {
    let reg = MemoryRegistry::new();
    reg.open(Document::new(1, 1));
    let engine = engine_with(&reg).await;
    reg.set_fail_queries(true);
    assert!(engine.build_view(w(1)).await.is_empty());
}

#[tokio::test]
async fn snapshots_are_limited_to_the_view() {
    let reg = MemoryRegistry::new();
    reg.open(Document::new(1, 1).active());
    reg.open(Document::new(2, 2).active());
    let engine = engine_with(&reg).await;
    engine.touch(w(1), d(1)).await;
    engine.capture_snapshot(w(1), d(1)).await;
    engine.touch(w(2), d(2)).await;
    engine.capture_snapshot(w(2), d(2)).await;

    let view = engine.build_view(w(1)).await;
    assert_eq!(view.snapshots.keys().copied().collect::<Vec<_>>(), ids(&[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_events_keep_structure_intact() {
    let reg = MemoryRegistry::new();
    for id in 1..=20 {
        reg.open(Document::new(id, (id % 3) + 1).active());
    }
    let engine = engine_with(&reg).await;

    let mut tasks = Vec::new();
    for round in 0..40i64 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            let doc = (round % 20) + 1;
            let window = (doc % 3) + 1;
            engine.touch(w(window), d(doc)).await;
            engine.capture_snapshot(w(window), d(doc)).await;
            let view = engine.build_view(w(window)).await;
            assert!(view.ids().contains(&d(doc)));
        }));
    }
    for task in tasks {
        task.await.expect("task");
    }

    let state = engine.state().await;
    assert!(state.check_invariants().is_empty());
    for window in 1..=3 {
        let view = engine.build_view(w(window)).await;
        let mut seen = view.ids();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), view.tabs.len());
    }
}
