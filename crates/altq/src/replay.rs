//! `altq replay`: drive the engine through a scripted host session.
//!
//! A script is a RON document listing steps. Host-side steps change the
//! in-memory registry; `Event` steps go through the server exactly as host
//! events would; `View` and `Activate` steps issue overlay requests and print
//! the result.
//!
//! ```ron
//! (
//!     steps: [
//!         Open(id: 1, window: 1, title: Some("Inbox"), active: true),
//!         Event(DocumentActivated(window: 1, document: 1)),
//!         View(window: Some(1)),
//!     ],
//! )
//! ```

use std::{fmt::Write as _, fs, path::Path, sync::Arc};

use altq_engine::{Document, Engine, MemoryRegistry};
use altq_ids::{DocumentId, WindowId};
use altq_protocol::{Request, Response, ViewResponse};
use altq_server::{HostEvent, Server, Settings};
use altq_store::{FileStore, MemoryStore, StateStore};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// A parsed replay script.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Steps, applied in order.
    pub steps: Vec<Step>,
}

/// One scripted action.
#[derive(Debug, Clone, Deserialize)]
pub enum Step {
    /// Open a document in the registry.
    Open {
        /// Document id.
        id: DocumentId,
        /// Owning window.
        window: WindowId,
        /// Title, if any.
        #[serde(default)]
        title: Option<String>,
        /// Location, if any.
        #[serde(default)]
        url: Option<String>,
        /// Make it the active document of its window.
        #[serde(default)]
        active: bool,
    },
    /// Close a document in the registry without telling the server.
    Close(DocumentId),
    /// Close every document in a window without telling the server.
    CloseWindow(WindowId),
    /// Make a document active in the registry.
    SetActive(DocumentId),
    /// Mark a window as last focused in the registry.
    Focus(WindowId),
    /// Make captures of a window fail or succeed.
    Restrict(WindowId, bool),
    /// Make every registry query fail or succeed.
    FailQueries(bool),
    /// Deliver a host event to the server.
    Event(HostEvent),
    /// Request and print the view for a window.
    View {
        /// Window to view.
        #[serde(default)]
        window: Option<WindowId>,
    },
    /// Request activation of a document and print the outcome.
    Activate(DocumentId),
}

impl Script {
    /// Parse a script from RON text.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        ron::from_str(text).map_err(|e| Error::Script {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read and parse the script at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }
}

/// Run `script` and return the printed transcript.
///
/// State is kept in memory unless `state_path` is given, in which case it is
/// loaded from and written to that file.
pub async fn run(script: &Script, settings: &Settings, state_path: Option<&Path>) -> Result<String> {
    let registry = MemoryRegistry::new();
    let store: Arc<dyn StateStore> = match state_path {
        Some(path) => Arc::new(FileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };
    let engine = Engine::open(store.clone(), Arc::new(registry.clone()), settings.engine_cfg()).await;
    let server = Server::spawn(engine.clone(), settings.server_cfg());

    let mut out = String::new();
    for (n, step) in script.steps.iter().enumerate() {
        debug!(step = n, ?step, "replay");
        match step {
            Step::Open {
                id,
                window,
                title,
                url,
                active,
            } => {
                let mut doc = Document::new(*id, *window);
                doc.title = title.clone();
                doc.url = url.clone();
                doc.active = *active;
                registry.open(doc);
            }
            Step::Close(id) => {
                registry.close(*id);
            }
            Step::CloseWindow(window) => registry.close_window(*window),
            Step::SetActive(id) => {
                registry.set_active(*id);
            }
            Step::Focus(window) => registry.focus_window(*window),
            Step::Restrict(window, restricted) => registry.set_restricted(*window, *restricted),
            Step::FailQueries(fail) => registry.set_fail_queries(*fail),
            Step::Event(event) => server.apply(event.clone()).await,
            Step::View { window } => {
                let resp = server.request(Request::GetView { window: *window }).await;
                if let Response::View(view) = resp {
                    write_view(&mut out, *window, &view);
                }
            }
            Step::Activate(document) => {
                let resp = server.request(Request::Activate { document: *document }).await;
                let ok = matches!(resp, Response::Ack { ok: true });
                let _ignored = writeln!(out, "activate {document}: ok={ok}");
            }
        }
    }

    // Written even when no step mutated the state.
    store.save(&engine.state().await).await?;
    Ok(out)
}

/// Append one view to the transcript.
fn write_view(out: &mut String, window: Option<WindowId>, view: &ViewResponse) {
    let label = window.map_or_else(|| "none".to_string(), |w| w.to_string());
    let _ignored = writeln!(
        out,
        "view window={label} ok={} tabs={}",
        view.ok,
        view.ordered_tabs.len()
    );
    for tab in &view.ordered_tabs {
        let active = if tab.is_active { "*" } else { " " };
        let snap = if view.snapshots.contains_key(&tab.id) {
            " [snapshot]"
        } else {
            ""
        };
        let _ignored = writeln!(out, "  {active}{:>4} {}{snap}", tab.id.get(), tab.title);
    }
}
