//! GraphQL client
//!
//! Queries and mutations go over HTTP. Subscriptions share one lazily
//! opened WebSocket; if that socket has died, the next subscription opens
//! a fresh one.

use crate::config::GraphqlConfig;
use crate::error::GraphqlError;
use crate::http::HttpTransport;
use crate::protocol::GraphqlRequest;
use crate::ws::{ConnectionStats, SubscriptionEvent, WsConnection};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::info;

/// Open operation on the shared socket
#[derive(Debug)]
pub struct WsOperation {
    /// Operation id on the connection
    pub id: u64,
    /// Connection the operation runs on
    pub connection: Arc<WsConnection>,
    /// Incoming events
    pub events: mpsc::UnboundedReceiver<SubscriptionEvent>,
}

/// Client for one API deployment
#[derive(Debug)]
pub struct GraphqlClient {
    config: Arc<GraphqlConfig>,
    http: HttpTransport,
    socket: Mutex<Option<Arc<WsConnection>>>,
}

impl GraphqlClient {
    /// Create a client; no connection is opened yet
    ///
    /// # Errors
    /// `GraphqlError::Config` if the configuration does not validate
    pub fn new(config: GraphqlConfig) -> Result<Self, GraphqlError> {
        config.validate()?;
        let http = HttpTransport::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            http,
            socket: Mutex::new(None),
        })
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GraphqlConfig {
        &self.config
    }

    /// Run a query or mutation and return its `data`
    ///
    /// # Errors
    /// See [`HttpTransport::execute`]
    pub async fn execute(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError> {
        self.http.execute(request).await
    }

    /// Start a subscription on the shared socket
    ///
    /// # Errors
    /// Connection errors from [`WsConnection::connect`], or
    /// `GraphqlError::ConnectionClosed` if the socket dies between
    /// connecting and starting
    pub async fn subscribe(&self, request: GraphqlRequest) -> Result<WsOperation, GraphqlError> {
        let connection = self.connection().await?;
        let (id, events) = connection.start(request)?;
        Ok(WsOperation {
            id,
            connection,
            events,
        })
    }

    async fn connection(&self) -> Result<Arc<WsConnection>, GraphqlError> {
        let mut slot = self.socket.lock().await;
        if let Some(existing) = slot.as_ref().filter(|c| c.is_alive()) {
            return Ok(Arc::clone(existing));
        }
        if slot.is_some() {
            info!("websocket lost, reconnecting");
        }
        let fresh = Arc::new(WsConnection::connect(&self.config).await?);
        *slot = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    /// Counters of the current socket, if one is open
    pub async fn connection_stats(&self) -> Option<ConnectionStats> {
        self.socket.lock().await.as_ref().map(|c| c.stats())
    }

    /// Terminate the socket, if one is open
    pub async fn close(&self) {
        if let Some(connection) = self.socket.lock().await.take() {
            connection.close();
        }
    }
}
