//! Errors reported by the command-line tools.

use std::{io, path::PathBuf};

use altq_server::SettingsError;
use altq_store::StoreError;
use thiserror::Error;

/// Anything that stops a command.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The state file could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// An input file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A replay script did not parse.
    #[error("invalid replay script {}: {message}", .path.display())]
    Script {
        /// Script path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// A file that must exist does not.
    #[error("no such file: {}", .0.display())]
    Missing(PathBuf),
    /// A command argument is out of range.
    #[error("{0}")]
    Usage(String),
}

/// Result alias for command functions.
pub type Result<T> = std::result::Result<T, Error>;
