use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the store crate.
pub type Result<T> = StdResult<T, StoreError>;

/// Failures raised while loading or saving cache state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The stored document is not valid cache state.
    #[error("failed to decode state at {}: {source}", path.display())]
    Decode {
        /// File being decoded.
        path: PathBuf,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// The in-memory state could not be serialized.
    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),

    /// The backing store refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
