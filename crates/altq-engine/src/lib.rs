//! altq-engine
//!
//! The engine keeps a recency-ordered list of documents per window and a
//! bounded cache of visual snapshots, reconciled against the host registry:
//! - [`Engine`]: applies activation, focus, capture and removal events,
//!   enforces the per-window snapshot cap, and builds ordered views
//! - [`Registry`]: the host boundary, with [`MemoryRegistry`] for tests
//! - [`merge_order`]: the pure recency/live merge behind [`Engine::build_view`]
use std::time::Duration;

mod engine;
mod registry;
mod view;

pub use engine::Engine;
pub use registry::{Document, DocumentQuery, MemoryRegistry, Registry, RegistryError};
pub use view::{OrderedView, merge_order};

/// Default number of snapshots kept per window.
pub const MAX_SNAPSHOTS_PER_WINDOW: usize = 12;

/// Default bound on a single registry call.
const REGISTRY_TIMEOUT_MS: u64 = 2_000;

/// Engine tunables.
#[derive(Clone, Debug)]
pub struct EngineCfg {
    /// Snapshots kept per window; the keep-set is this many most recent ids.
    pub max_snapshots_per_window: usize,
    /// Upper bound on any single registry call.
    pub registry_timeout: Duration,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            max_snapshots_per_window: MAX_SNAPSHOTS_PER_WINDOW,
            registry_timeout: Duration::from_millis(REGISTRY_TIMEOUT_MS),
        }
    }
}
