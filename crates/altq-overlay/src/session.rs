//! Overlay session state machine: trigger debounce, selection, navigation.

use std::{collections::BTreeMap, sync::Arc, time::Instant};

use altq_ids::{DocumentId, WindowId};
use altq_layout::{GridSize, Rect, layout_cells, pack_grid};
use altq_protocol::{DisplayItem, Snapshot};
use tracing::{debug, trace};

use crate::{OverlayCfg, ViewSource};

/// Outcome of feeding input to an [`OverlaySession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    /// State changed; repaint.
    Update,
    /// The document was activated and the overlay closed.
    Activated(DocumentId),
    /// The overlay closed.
    Closed,
    /// Input ignored.
    None,
}

/// Keys the overlay reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKey {
    /// Previous tab, wrapping.
    Left,
    /// Next tab, wrapping.
    Right,
    /// One grid row up.
    Up,
    /// One grid row down.
    Down,
    /// Activate the selection.
    Enter,
    /// Dismiss.
    Escape,
}

/// One window's switcher overlay.
pub struct OverlaySession {
    source: Arc<dyn ViewSource>,
    window: Option<WindowId>,
    cfg: OverlayCfg,
    open: bool,
    tabs: Vec<DisplayItem>,
    snapshots: BTreeMap<DocumentId, Snapshot>,
    selected: usize,
    viewport: Rect,
    grid: GridSize,
    cells: Vec<Rect>,
    /// Time of the last accepted trigger.
    last_trigger: Option<Instant>,
}

impl std::fmt::Debug for OverlaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlaySession")
            .field("window", &self.window)
            .field("open", &self.open)
            .field("tabs", &self.tabs.len())
            .field("selected", &self.selected)
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}

impl OverlaySession {
    /// A closed session for `window`.
    pub fn new(source: Arc<dyn ViewSource>, window: Option<WindowId>, cfg: OverlayCfg) -> Self {
        Self {
            source,
            window,
            cfg,
            open: false,
            tabs: Vec::new(),
            snapshots: BTreeMap::new(),
            selected: 0,
            viewport: Rect::new(0.0, 0.0, 0.0, 0.0),
            grid: GridSize::new(1, 1),
            cells: Vec::new(),
            last_trigger: None,
        }
    }

    /// Open the overlay, or advance the selection when already open.
    ///
    /// Triggers within the debounce window of the last accepted one are
    /// ignored. An unusable or empty view closes the overlay.
    pub async fn trigger(&mut self, now: Instant, viewport: Rect) -> OverlayEvent {
        if let Some(last) = self.last_trigger
            && now.saturating_duration_since(last) < self.cfg.trigger_debounce
        {
            trace!("trigger debounced");
            return OverlayEvent::None;
        }
        self.last_trigger = Some(now);

        let was_open = self.open;
        let view = self.source.get_view(self.window).await;
        if !view.ok || view.ordered_tabs.is_empty() {
            debug!(ok = view.ok, "nothing to show");
            return self.close();
        }
        self.tabs = view.ordered_tabs;
        self.snapshots = view.snapshots;

        let len = self.tabs.len();
        self.selected = if was_open {
            (self.selected % len + 1) % len
        } else if len > 1 {
            1
        } else {
            0
        };
        self.open = true;
        self.relayout(viewport);
        trace!(tabs = len, selected = self.selected, "overlay shown");
        OverlayEvent::Update
    }

    /// Handle a key press. Keys are ignored while closed.
    pub async fn handle_key(&mut self, key: OverlayKey) -> OverlayEvent {
        if !self.open {
            return OverlayEvent::None;
        }
        let len = self.tabs.len();
        match key {
            OverlayKey::Right if len > 0 => {
                self.selected = (self.selected + 1) % len;
                OverlayEvent::Update
            }
            OverlayKey::Left if len > 0 => {
                self.selected = (self.selected + len - 1) % len;
                OverlayEvent::Update
            }
            OverlayKey::Down if len > 0 => {
                let next = (self.selected + self.grid.columns).min(len - 1);
                self.select(next)
            }
            OverlayKey::Up => {
                let next = self.selected.saturating_sub(self.grid.columns);
                self.select(next)
            }
            OverlayKey::Enter => {
                let Some(id) = self.selected_item().map(|t| t.id) else {
                    return self.close();
                };
                let ok = self.source.activate(id).await;
                self.close();
                if ok {
                    OverlayEvent::Activated(id)
                } else {
                    debug!(document = %id, "activation failed");
                    OverlayEvent::Closed
                }
            }
            OverlayKey::Escape => self.close(),
            _ => OverlayEvent::None,
        }
    }

    /// Recompute the grid for a new viewport.
    pub fn resize(&mut self, viewport: Rect) -> OverlayEvent {
        self.relayout(viewport);
        if self.open {
            OverlayEvent::Update
        } else {
            OverlayEvent::None
        }
    }

    /// Whether the overlay is showing.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Index of the selected tab.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// The selected tab, if any.
    pub fn selected_item(&self) -> Option<&DisplayItem> {
        self.tabs.get(self.selected)
    }

    /// Tabs in display order.
    pub fn tabs(&self) -> &[DisplayItem] {
        &self.tabs
    }

    /// Current grid partition.
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Viewport the cells were laid out in.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Cell rectangles, one per tab.
    pub fn cells(&self) -> &[Rect] {
        &self.cells
    }

    /// Cached snapshot for a tab.
    pub fn snapshot(&self, id: DocumentId) -> Option<&Snapshot> {
        self.snapshots.get(&id)
    }

    /// Move the selection, reporting whether it changed.
    fn select(&mut self, index: usize) -> OverlayEvent {
        if index == self.selected {
            OverlayEvent::None
        } else {
            self.selected = index;
            OverlayEvent::Update
        }
    }

    /// Repack the grid and cells for `viewport`.
    fn relayout(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.grid = pack_grid(self.tabs.len(), viewport.w, viewport.h);
        self.cells = layout_cells(self.tabs.len(), viewport, self.cfg.cell_spacing);
    }

    /// Hide the overlay and drop its data. Reports `Closed` only if it was
    /// showing.
    fn close(&mut self) -> OverlayEvent {
        let was_open = self.open;
        self.open = false;
        self.tabs.clear();
        self.snapshots.clear();
        self.cells.clear();
        self.selected = 0;
        if was_open {
            OverlayEvent::Closed
        } else {
            OverlayEvent::None
        }
    }
}
