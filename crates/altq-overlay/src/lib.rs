//! altq-overlay
//!
//! Renderer-independent state for the switcher overlay. An
//! [`OverlaySession`] reacts to trigger signals and navigation keys, fetching
//! ordered views and activating documents through a [`ViewSource`]. Painting
//! is left to the caller, which reads the selection and cell rectangles back
//! out of the session.
use std::time::Duration;

mod session;
mod source;

pub use session::{OverlayEvent, OverlayKey, OverlaySession};
pub use source::{StaticSource, ViewSource};

/// Default window in which a repeated trigger is ignored.
pub const TRIGGER_DEBOUNCE_MS: u64 = 90;

/// Default gap between grid cells and around the grid.
const CELL_SPACING: f64 = 12.0;

/// Overlay tunables.
#[derive(Clone, Debug)]
pub struct OverlayCfg {
    /// A trigger arriving sooner than this after the last accepted one is
    /// ignored.
    pub trigger_debounce: Duration,
    /// Gap between cells and around the grid, in viewport units.
    pub cell_spacing: f64,
}

impl Default for OverlayCfg {
    fn default() -> Self {
        Self {
            trigger_debounce: Duration::from_millis(TRIGGER_DEBOUNCE_MS),
            cell_spacing: CELL_SPACING,
        }
    }
}
