//! User settings, loaded from a RON file.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use altq_engine::{EngineCfg, MAX_SNAPSHOTS_PER_WINDOW};
use altq_overlay::{OverlayCfg, TRIGGER_DEBOUNCE_MS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ServerCfg;

/// Errors produced while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings at {}: {source}", .path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The settings text is not valid RON for [`Settings`].
    #[error("invalid settings{}: {message}", .path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Parse {
        /// File being parsed, when known.
        path: Option<PathBuf>,
        /// Parser message including the location.
        message: String,
    },
    /// A value parsed but is out of range.
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Tunables for the whole service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Snapshots kept per window.
    pub max_snapshots_per_window: usize,
    /// Repeated overlay triggers inside this window are ignored.
    pub trigger_debounce_ms: u64,
    /// Capture a snapshot whenever a document is activated.
    pub capture_on_activate: bool,
    /// Where the cache state lives. `None` keeps it in memory.
    pub state_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_snapshots_per_window: MAX_SNAPSHOTS_PER_WINDOW,
            trigger_debounce_ms: TRIGGER_DEBOUNCE_MS,
            capture_on_activate: true,
            state_path: None,
        }
    }
}

/// Preferred settings location (`~/.altq/settings.ron`).
pub fn default_settings_path() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(".altq");
    p.push("settings.ron");
    p
}

impl Settings {
    /// Parse settings from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        Self::parse(text, None)
    }

    /// Load settings.
    ///
    /// An `explicit` path must exist. Without one, `~/.altq/settings.ron` is
    /// used when present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let preferred = default_settings_path();
                if !preferred.exists() {
                    return Ok(Self::default());
                }
                preferred
            }
        };
        let text = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&text, Some(path))
    }

    /// Parse and validate, attributing errors to `path`.
    fn parse(text: &str, path: Option<PathBuf>) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(text).map_err(|e| SettingsError::Parse {
            path,
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_snapshots_per_window == 0 {
            return Err(SettingsError::Invalid(
                "max_snapshots_per_window must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Engine configuration for these settings.
    pub fn engine_cfg(&self) -> EngineCfg {
        EngineCfg {
            max_snapshots_per_window: self.max_snapshots_per_window,
            ..EngineCfg::default()
        }
    }

    /// Overlay configuration for these settings.
    pub fn overlay_cfg(&self) -> OverlayCfg {
        OverlayCfg {
            trigger_debounce: Duration::from_millis(self.trigger_debounce_ms),
            ..OverlayCfg::default()
        }
    }

    /// Server configuration for these settings.
    pub fn server_cfg(&self) -> ServerCfg {
        ServerCfg {
            capture_on_activate: self.capture_on_activate,
        }
    }
}
