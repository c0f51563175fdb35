//! altq-store: durable cache state
//!
//! Holds the single document the switcher persists: per-window recency lists
//! and per-document snapshot records. The store has no policy of its own; the
//! engine decides what to write and this crate only loads and saves it whole.

use async_trait::async_trait;

mod error;
mod file;
mod memory;
mod state;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use state::{CacheState, PruneStats, SnapshotRecord, Violation};

/// Load/save access to the durable cache state under a single logical key.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the stored state, or the empty default when nothing was saved yet.
    async fn load(&self) -> Result<CacheState>;

    /// Replace the stored state with `state`.
    async fn save(&self, state: &CacheState) -> Result<()>;
}
