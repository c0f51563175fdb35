//! altq-server: host event loop and overlay request handling.
//!
//! A single actor task owns the [`Engine`] and drains one command channel, so
//! host events and overlay requests are applied in arrival order. Callers
//! talk to it through a cheap, clonable [`ServerHandle`].

use std::sync::Arc;

use altq_engine::{DocumentQuery, Engine, OrderedView};
use altq_ids::{DocumentId, WindowId};
use altq_overlay::ViewSource;
use altq_protocol::{
    DisplayItem, Notification, Request, Response, Snapshot, ViewResponse,
    ipc::{NotifyRx, NotifyTx, codec, notify_channel},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

mod settings;
pub mod test_support;

pub use settings::{Settings, SettingsError, default_settings_path};

/// Command name that opens or advances the switcher.
pub const TOGGLE_SWITCHER: &str = "toggle-switcher";

/// Events reported by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostEvent {
    /// A document became the active one in its window.
    DocumentActivated {
        /// Window containing the document.
        window: WindowId,
        /// The activated document.
        document: DocumentId,
    },
    /// A document closed.
    DocumentRemoved {
        /// The closed document.
        document: DocumentId,
    },
    /// Window focus moved. [`WindowId::NONE`] when no window has focus.
    FocusChanged {
        /// Newly focused window.
        window: WindowId,
    },
    /// A keyboard command was invoked.
    Command {
        /// Command name.
        name: String,
    },
    /// The service was installed or updated.
    Installed,
}

/// Server behaviour switches.
#[derive(Debug, Clone)]
pub struct ServerCfg {
    /// Capture a snapshot after each activation.
    pub capture_on_activate: bool,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            capture_on_activate: true,
        }
    }
}

/// Notification buffer per subscriber.
const NOTIFY_CAPACITY: usize = 64;

/// Cheap, clonable handle to the server.
#[derive(Clone, Debug)]
pub struct ServerHandle {
    /// Command channel into the actor.
    tx: mpsc::UnboundedSender<Command>,
    /// Notification sender, kept for subscribing.
    notify: NotifyTx,
}

impl ServerHandle {
    /// Subscribe to notifications for renderers.
    pub fn subscribe(&self) -> NotifyRx {
        self.notify.subscribe()
    }

    /// Queue a host event without waiting for it to be applied.
    pub fn host_event(&self, event: HostEvent) {
        if self.tx.send(Command::Host { event, done: None }).is_err() {
            warn!("server stopped; host event dropped");
        }
    }

    /// Queue a host event and wait until it has been applied.
    pub async fn apply(&self, event: HostEvent) {
        let (tx, rx) = oneshot::channel();
        let cmd = Command::Host {
            event,
            done: Some(tx),
        };
        if self.tx.send(cmd).is_err() {
            warn!("server stopped; host event dropped");
            return;
        }
        let _ignored = rx.await;
    }

    /// Answer an overlay request. A stopped server answers with failures.
    pub async fn request(&self, req: Request) -> Response {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(Command::Request { req, respond: tx }).is_err() {
            return fallback(req);
        }
        rx.await.unwrap_or_else(|_| fallback(req))
    }

    /// Answer an encoded request with an encoded response.
    pub async fn request_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, codec::Error> {
        let req = codec::decode_request(bytes)?;
        let resp = self.request(req).await;
        codec::encode_response(&resp)
    }
}

#[async_trait]
impl ViewSource for ServerHandle {
    async fn get_view(&self, window: Option<WindowId>) -> ViewResponse {
        match self.request(Request::GetView { window }).await {
            Response::View(view) => view,
            Response::Ack { .. } => ViewResponse::rejected(),
        }
    }

    async fn activate(&self, document: DocumentId) -> bool {
        matches!(
            self.request(Request::Activate { document }).await,
            Response::Ack { ok: true }
        )
    }
}

/// Response used when the actor is gone.
fn fallback(req: Request) -> Response {
    match req {
        Request::GetView { .. } => Response::View(ViewResponse::rejected()),
        Request::Activate { .. } => Response::Ack { ok: false },
    }
}

/// Server constructor. Spawns the actor and returns a handle.
pub struct Server;

impl Server {
    /// Spawn the actor on the current tokio runtime.
    pub fn spawn(engine: Engine, cfg: ServerCfg) -> ServerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (notify, _rx) = notify_channel(NOTIFY_CAPACITY);
        let actor = Actor {
            engine,
            cfg,
            notify: notify.clone(),
        };
        tokio::spawn(run_actor(rx, actor));
        ServerHandle { tx, notify }
    }
}

/// Messages drained by the actor.
enum Command {
    /// Apply a host event.
    Host {
        /// The event.
        event: HostEvent,
        /// Signalled once the event is applied.
        done: Option<oneshot::Sender<()>>,
    },
    /// Answer an overlay request.
    Request {
        /// The request.
        req: Request,
        /// Reply slot.
        respond: oneshot::Sender<Response>,
    },
}

/// State owned by the actor task.
struct Actor {
    /// Shared engine.
    engine: Engine,
    /// Behaviour switches.
    cfg: ServerCfg,
    /// Renderer notifications.
    notify: NotifyTx,
}

/// Drain commands until every handle is dropped.
async fn run_actor(mut rx: mpsc::UnboundedReceiver<Command>, actor: Actor) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Host { event, done } => {
                actor.handle_event(event).await;
                if let Some(done) = done {
                    let _ignored = done.send(());
                }
            }
            Command::Request { req, respond } => {
                let _ignored = respond.send(actor.handle_request(req).await);
            }
        }
    }
    debug!("server actor stopped");
}

impl Actor {
    /// Apply one host event to the engine.
    async fn handle_event(&self, event: HostEvent) {
        trace!(?event, "host event");
        match event {
            HostEvent::DocumentActivated { window, document } => {
                self.engine.touch(window, document).await;
                if self.cfg.capture_on_activate {
                    self.engine.capture_snapshot(window, document).await;
                }
            }
            HostEvent::DocumentRemoved { document } => {
                self.engine.remove_document(document).await;
            }
            HostEvent::FocusChanged { window } => {
                self.engine.record_focus_change(window).await;
            }
            HostEvent::Command { name } if name == TOGGLE_SWITCHER => {
                let query = DocumentQuery::active_in_last_focused();
                if self.engine.active_document(query).await.is_none() {
                    debug!("no active document to trigger in");
                    return;
                }
                if self.notify.send(Notification::Trigger).is_err() {
                    debug!("trigger sent with no renderer listening");
                }
            }
            HostEvent::Command { name } => trace!(%name, "unrecognised command"),
            HostEvent::Installed => self.engine.persist().await,
        }
    }

    /// Answer one overlay request.
    async fn handle_request(&self, req: Request) -> Response {
        match req {
            Request::GetView { window } => match window {
                Some(window) if window.is_valid() => {
                    Response::View(view_response(self.engine.build_view(window).await))
                }
                _ => {
                    debug!(?window, "view requested without a usable window");
                    Response::View(ViewResponse::rejected())
                }
            },
            Request::Activate { document } => Response::Ack {
                ok: self.engine.activate(document).await,
            },
        }
    }
}

/// Project an engine view onto the wire shape.
pub fn view_response(view: OrderedView) -> ViewResponse {
    let ordered_tabs = view
        .tabs
        .iter()
        .map(|d| {
            DisplayItem::new(
                d.id,
                d.title.as_deref(),
                d.icon_url.as_deref(),
                d.url.as_deref(),
                d.active,
            )
        })
        .collect();
    let snapshots = view
        .snapshots
        .into_iter()
        .map(|(id, record)| {
            (
                id,
                Snapshot {
                    image: record.image,
                    captured_at_ms: record.captured_at_ms,
                },
            )
        })
        .collect();
    ViewResponse {
        ok: true,
        ordered_tabs,
        snapshots,
    }
}

/// Shared pointer to a running server, for callers that need `dyn ViewSource`.
pub fn view_source(handle: &ServerHandle) -> Arc<dyn ViewSource> {
    Arc::new(handle.clone())
}
