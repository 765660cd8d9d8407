//! Event channel client: one authenticated WebSocket per session.
//!
//! Frames are JSON text, either `{"event": "task:assigned", "data": {...}}`
//! or the array form `["task:assigned", {...}]`. Each recognised event is
//! forwarded to the handler registered for its kind. A handler is a bounded
//! queue; when it is full the event is dropped (delivery is at-most-once).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures::StreamExt;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use taskpulse_core::{Error, InboundEvent, Result, TaskEventKind};

type Handlers = Arc<RwLock<HashMap<TaskEventKind, mpsc::Sender<InboundEvent>>>>;
type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection state published to the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Disconnected,
    Connected,
    /// The connection could not be established or was lost.
    Failed(String),
}

/// Wire frame shapes accepted from the server.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Frame {
    Named {
        event: String,
        #[serde(default)]
        data: serde_json::Value,
    },
    Tuple(String, serde_json::Value),
}

impl Frame {
    fn into_parts(self) -> (String, serde_json::Value) {
        match self {
            Frame::Named { event, data } => (event, data),
            Frame::Tuple(event, data) => (event, data),
        }
    }
}

struct Connection {
    token: String,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Client side of the server-pushed task event stream.
pub struct EventChannel {
    url: String,
    handlers: Handlers,
    connection: Option<Connection>,
    status_tx: watch::Sender<ChannelStatus>,
}

impl EventChannel {
    pub fn new(url: impl Into<String>) -> Self {
        let (status_tx, _) = watch::channel(ChannelStatus::Disconnected);
        Self {
            url: url.into(),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            connection: None,
            status_tx,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Register the handler for `kind`. A previous handler for the same kind
    /// is replaced, never duplicated. Returns whether one was replaced.
    pub fn on_event(&self, kind: TaskEventKind, handler: mpsc::Sender<InboundEvent>) -> bool {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let replaced = handlers.insert(kind, handler).is_some();
        debug!(event = %kind, replaced, "Registered event handler");
        replaced
    }

    /// Remove the handler for `kind`. Returns whether one was registered.
    pub fn off_event(&self, kind: TaskEventKind) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&kind)
            .is_some()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Watch connection state changes.
    pub fn status(&self) -> watch::Receiver<ChannelStatus> {
        self.status_tx.subscribe()
    }

    pub fn current_status(&self) -> ChannelStatus {
        self.status_tx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|conn| !conn.task.is_finished())
    }

    /// Token of the current connection, if any.
    pub fn token(&self) -> Option<&str> {
        self.connection.as_ref().map(|conn| conn.token.as_str())
    }

    /// Connect with `token`. A live connection with the same token is kept;
    /// a different token replaces it.
    pub async fn connect(&mut self, token: &str) -> Result<()> {
        if self.is_connected() && self.token() == Some(token) {
            trace!("Event channel already connected with this token");
            return Ok(());
        }
        self.disconnect().await;

        let socket = match open_socket(&self.url, token).await {
            Ok(socket) => socket,
            Err(e) => {
                warn!(url = %self.url, error = %e, "Event channel connection failed");
                self.status_tx
                    .send_replace(ChannelStatus::Failed(e.to_string()));
                return Err(e);
            }
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(read_loop(
            socket,
            self.handlers.clone(),
            self.status_tx.clone(),
            shutdown_rx,
        ));

        self.connection = Some(Connection {
            token: token.to_string(),
            shutdown_tx,
            task,
        });
        self.status_tx.send_replace(ChannelStatus::Connected);
        info!(url = %self.url, "Event channel connected");
        Ok(())
    }

    /// Close the connection. Safe to call repeatedly or when never connected.
    pub async fn disconnect(&mut self) {
        let Some(conn) = self.connection.take() else {
            return;
        };
        let _ = conn.shutdown_tx.send(());
        if let Err(e) = conn.task.await {
            if e.is_panic() {
                warn!(error = ?e, "Event channel reader panicked");
            }
        }
        self.status_tx.send_replace(ChannelStatus::Disconnected);
        info!(url = %self.url, "Event channel disconnected");
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.task.abort();
        }
    }
}

async fn open_socket(url: &str, token: &str) -> Result<Socket> {
    let mut request = url
        .into_client_request()
        .map_err(|e| Error::Channel(format!("Invalid event channel URL: {}", e)))?;
    let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| Error::Channel(format!("Invalid token: {}", e)))?;
    request.headers_mut().insert(AUTHORIZATION, value);

    let (socket, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::Channel(format!("Failed to connect: {}", e)))?;
    Ok(socket)
}

async fn read_loop(
    mut socket: Socket,
    handlers: Handlers,
    status_tx: watch::Sender<ChannelStatus>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                let _ = socket.close(None).await;
                break;
            }
            message = socket.next() => match message {
                Some(Ok(Message::Text(text))) => dispatch(&text, &handlers),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Event channel closed by server");
                    status_tx.send_replace(ChannelStatus::Failed("closed by server".to_string()));
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Event channel read failed");
                    status_tx.send_replace(ChannelStatus::Failed(e.to_string()));
                    break;
                }
                None => {
                    status_tx.send_replace(ChannelStatus::Failed("stream ended".to_string()));
                    break;
                }
            }
        }
    }
}

/// Parse one text frame and hand it to the matching handler.
fn dispatch(text: &str, handlers: &Handlers) {
    let (name, payload) = match serde_json::from_str::<Frame>(text) {
        Ok(frame) => frame.into_parts(),
        Err(e) => {
            debug!(error = %e, "Unparseable event frame dropped");
            return;
        }
    };

    let Some(kind) = TaskEventKind::from_wire(&name) else {
        trace!(event = %name, "Unknown event dropped");
        return;
    };

    let handler = handlers
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&kind)
        .cloned();
    let Some(handler) = handler else {
        trace!(event = %kind, "No handler registered, event dropped");
        return;
    };

    match handler.try_send(InboundEvent { kind, payload }) {
        Ok(()) => trace!(event = %kind, "Event forwarded"),
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(event = %kind, "Event queue full, event dropped");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(event = %kind, "Event handler closed, event dropped");
        }
    }
}
