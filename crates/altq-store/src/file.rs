//! JSON file backing for [`CacheState`].

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    process,
};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::{CacheState, Result, StateStore, StoreError};

/// Stores the whole cache state as one JSON document on disk.
///
/// Saves go through a sibling temporary file that is renamed over the target,
/// so a concurrent reader sees either the previous or the new document.
#[derive(Clone, Debug)]
pub struct FileStore {
    /// Target document path.
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by `path`. Nothing is touched until the first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temporary sibling used for atomic replacement.
    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state".to_string());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", process::id()))
    }

    /// Wrap an I/O error with the path it concerns.
    fn io_err(path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn load(&self) -> Result<CacheState> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "state file missing; starting empty");
                return Ok(CacheState::default());
            }
            Err(e) => return Err(Self::io_err(&self.path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, state: &CacheState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state).map_err(StoreError::Encode)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_err(parent, e))?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| Self::io_err(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Self::io_err(&self.path, e))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "state saved");
        Ok(())
    }
}
