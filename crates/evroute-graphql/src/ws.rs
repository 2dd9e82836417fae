//! Multiplexed `graphql-ws` connection
//!
//! One socket carries every subscription. A writer task drains a command
//! channel into the socket; a reader task routes incoming messages to
//! per-operation channels kept in a concurrent map. When the socket goes
//! away every open operation receives [`SubscriptionEvent::Closed`].

use crate::config::GraphqlConfig;
use crate::error::GraphqlError;
use crate::protocol::{
    describe_payload, ClientMessage, GraphqlRequest, GraphqlResponse, ServerMessage, SUBPROTOCOL,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, trace, warn};

/// What an operation receives
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// `data` message
    Data(GraphqlResponse),
    /// `error` message; the operation is over
    Error(String),
    /// `complete` message; the operation is over
    Complete,
    /// Connection lost; the operation is over
    Closed(String),
}

/// Connection counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Operations started
    pub opened: usize,
    /// Operations currently registered
    pub active: usize,
    /// Operations ended by the server (`complete` or `error`)
    pub completed: usize,
    /// Operations stopped by the client
    pub stopped: usize,
}

#[derive(Debug)]
enum Command {
    Send(ClientMessage),
    Close,
}

type Registry = DashMap<u64, mpsc::UnboundedSender<SubscriptionEvent>>;

/// Live WebSocket session
#[derive(Debug)]
pub struct WsConnection {
    commands: mpsc::UnboundedSender<Command>,
    operations: Arc<Registry>,
    next_id: AtomicU64,
    alive: Arc<AtomicBool>,
    stats: Arc<Mutex<ConnectionStats>>,
}

impl WsConnection {
    /// Open the socket and complete the `connection_init` handshake
    ///
    /// # Errors
    /// - `GraphqlError::WebSocket` if the socket cannot be opened
    /// - `GraphqlError::ConnectionRejected` on `connection_error`
    /// - `GraphqlError::AckTimeout` if no acknowledgement arrives in time
    /// - `GraphqlError::ConnectionClosed` if the server hangs up first
    pub async fn connect(config: &GraphqlConfig) -> Result<Self, GraphqlError> {
        let mut request = config.ws_url.as_str().into_client_request()?;
        request
            .headers_mut()
            .insert("sec-websocket-protocol", HeaderValue::from_static(SUBPROTOCOL));

        let (socket, _response) = tokio_tungstenite::connect_async(request).await?;
        let (mut sink, mut stream) = socket.split();

        let mut headers = Map::new();
        for (name, value) in config.auth_headers() {
            headers.insert(name.to_string(), Value::String(value));
        }
        let init = ClientMessage::ConnectionInit {
            payload: Value::Object(headers),
        };
        sink.send(Message::Text(serde_json::to_string(&init)?)).await?;

        let handshake = async {
            loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str(&text)? {
                        ServerMessage::ConnectionAck => return Ok(()),
                        ServerMessage::ConnectionError { payload } => {
                            return Err(GraphqlError::ConnectionRejected(describe_payload(
                                &payload,
                            )))
                        }
                        other => trace!(?other, "ignored before ack"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(GraphqlError::ConnectionClosed)
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
        };
        tokio::time::timeout(config.ack_timeout(), handshake)
            .await
            .map_err(|_| GraphqlError::AckTimeout(config.ack_timeout()))??;
        info!(url = %config.ws_url, "websocket connected");

        let (commands, mut command_rx) = mpsc::unbounded_channel::<Command>();
        let operations: Arc<Registry> = Arc::new(DashMap::new());
        let alive = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(Mutex::new(ConnectionStats::default()));

        let writer_alive = Arc::clone(&alive);
        tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                let (message, last) = match command {
                    Command::Send(message) => (message, false),
                    Command::Close => (ClientMessage::ConnectionTerminate, true),
                };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "cannot encode client message");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    debug!(error = %e, "websocket write failed");
                    break;
                }
                if last {
                    let _ = sink.close().await;
                    break;
                }
            }
            writer_alive.store(false, Ordering::Release);
        });

        let reader_ops = Arc::clone(&operations);
        let reader_alive = Arc::clone(&alive);
        let reader_stats = Arc::clone(&stats);
        tokio::spawn(async move {
            let reason = loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        route_message(&text, &reader_ops, &reader_stats);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map_or_else(
                            || "closed by server".to_string(),
                            |f| format!("closed by server: {}", f.reason),
                        );
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break e.to_string(),
                    None => break "connection ended".to_string(),
                }
            };
            reader_alive.store(false, Ordering::Release);
            let ids: Vec<u64> = reader_ops.iter().map(|e| *e.key()).collect();
            for id in ids {
                if let Some((_, tx)) = reader_ops.remove(&id) {
                    let _ = tx.send(SubscriptionEvent::Closed(reason.clone()));
                    reader_stats.lock().active -= 1;
                }
            }
            info!(%reason, "websocket disconnected");
        });

        Ok(Self {
            commands,
            operations,
            next_id: AtomicU64::new(1),
            alive,
            stats,
        })
    }

    /// Start an operation
    ///
    /// # Errors
    /// `GraphqlError::ConnectionClosed` if the connection is gone
    pub fn start(
        &self,
        request: GraphqlRequest,
    ) -> Result<(u64, mpsc::UnboundedReceiver<SubscriptionEvent>), GraphqlError> {
        if !self.is_alive() {
            return Err(GraphqlError::ConnectionClosed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.operations.insert(id, tx);
        {
            let mut stats = self.stats.lock();
            stats.opened += 1;
            stats.active += 1;
        }

        let message = ClientMessage::Start {
            id: id.to_string(),
            payload: request,
        };
        if self.commands.send(Command::Send(message)).is_err() {
            if self.operations.remove(&id).is_some() {
                self.stats.lock().active -= 1;
            }
            return Err(GraphqlError::ConnectionClosed);
        }
        debug!(id, "operation started");
        Ok((id, rx))
    }

    /// Stop an operation
    ///
    /// Sends `stop` only while the operation is registered, so repeated
    /// calls and calls after `complete` send nothing.
    pub fn stop(&self, id: u64) -> bool {
        if self.operations.remove(&id).is_none() {
            return false;
        }
        {
            let mut stats = self.stats.lock();
            stats.active -= 1;
            stats.stopped += 1;
        }
        let _ = self.commands.send(Command::Send(ClientMessage::Stop { id: id.to_string() }));
        debug!(id, "operation stopped");
        true
    }

    /// Socket is still open
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Snapshot of the counters
    #[must_use]
    pub fn stats(&self) -> ConnectionStats {
        self.stats.lock().clone()
    }

    /// Send `connection_terminate` and close the socket
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.close();
    }
}

fn route_message(text: &str, operations: &Registry, stats: &Mutex<ConnectionStats>) {
    let message: ServerMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "unparseable server message");
            return;
        }
    };

    let (id, event) = match message {
        ServerMessage::Data { id, payload } => (id, SubscriptionEvent::Data(payload)),
        ServerMessage::Error { id, payload } => {
            (id, SubscriptionEvent::Error(describe_payload(&payload)))
        }
        ServerMessage::Complete { id } => (id, SubscriptionEvent::Complete),
        ServerMessage::Ka => return,
        other => {
            trace!(?other, "ignored server message");
            return;
        }
    };

    let Ok(id) = id.parse::<u64>() else {
        warn!(%id, "message for unknown operation id");
        return;
    };
    let ends = !matches!(event, SubscriptionEvent::Data(_));
    if ends {
        if let Some((_, tx)) = operations.remove(&id) {
            let _ = tx.send(event);
            let mut stats = stats.lock();
            stats.active -= 1;
            stats.completed += 1;
        }
    } else if let Some(tx) = operations.get(&id) {
        let _ = tx.send(event);
    } else {
        trace!(id, "data for stopped operation");
    }
}
