//! Test support utilities for `altq-server` consumers.
//! These helpers are public so integration tests and the replay command can
//! share them.

use std::{future::Future, sync::Arc, time::Duration};

use altq_engine::{Engine, MemoryRegistry};
use altq_protocol::{Notification, ipc::NotifyRx};
use altq_store::MemoryStore;
use parking_lot::Mutex;
use tokio::{runtime::Builder, time::timeout};

use crate::{Server, ServerHandle, Settings};

static TEST_LOCK: Mutex<()> = Mutex::new(());

/// Run an async test body on a dedicated multi-threaded Tokio runtime and shut it down promptly.
pub fn run_async_test<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let _guard = TEST_LOCK.lock();
    let rt = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("build test runtime");
    rt.block_on(fut);
    rt.shutdown_timeout(Duration::from_millis(50));
}

/// A server wired to in-memory collaborators.
pub struct Fixture {
    /// Host registry the engine reads.
    pub registry: MemoryRegistry,
    /// Backing store the engine writes.
    pub store: MemoryStore,
    /// The engine, shared with the server.
    pub engine: Engine,
    /// Handle to the running server.
    pub server: ServerHandle,
}

impl Fixture {
    /// Spawn a server using `settings` over empty in-memory collaborators.
    pub async fn new(settings: &Settings) -> Self {
        Self::with(MemoryRegistry::new(), MemoryStore::new(), settings).await
    }

    /// Spawn a server over the given collaborators.
    pub async fn with(registry: MemoryRegistry, store: MemoryStore, settings: &Settings) -> Self {
        let engine = Engine::open(
            Arc::new(store.clone()),
            Arc::new(registry.clone()),
            settings.engine_cfg(),
        )
        .await;
        let server = Server::spawn(engine.clone(), settings.server_cfg());
        Self {
            registry,
            store,
            engine,
            server,
        }
    }
}

/// Receive the next notification within `timeout_ms`.
pub async fn recv_notification(rx: &mut NotifyRx, timeout_ms: u64) -> Option<Notification> {
    timeout(Duration::from_millis(timeout_ms), rx.recv())
        .await
        .ok()
        .and_then(Result::ok)
}
