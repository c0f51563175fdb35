use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{CacheState, Result, StateStore, StoreError};

/// In-process store for tests and dry runs, with injectable failures.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Last saved document.
    state: Arc<Mutex<CacheState>>,
    /// Count of successful saves.
    saves: Arc<AtomicU64>,
    /// When set, `load` fails.
    fail_load: Arc<AtomicBool>,
    /// When set, `save` fails.
    fail_save: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `state`.
    pub fn with_state(state: CacheState) -> Self {
        let store = Self::new();
        *store.state.lock() = state;
        store
    }

    /// Make subsequent loads fail.
    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent saves fail.
    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// Copy of the last saved document.
    pub fn stored(&self) -> CacheState {
        self.state.lock().clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<CacheState> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("load disabled".into()));
        }
        Ok(self.state.lock().clone())
    }

    async fn save(&self, state: &CacheState) -> Result<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("save disabled".into()));
        }
        *self.state.lock() = state.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
