//! Transport and protocol errors

use evroute_core::BackendError;
use std::time::Duration;

/// Errors talking to the GraphQL API
#[derive(Debug, thiserror::Error)]
pub enum GraphqlError {
    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("cannot read config file {path}: {source}")]
    ConfigIo {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML
    #[error("cannot parse config: {0}")]
    ConfigParse(#[source] toml::de::Error),

    /// HTTP request failed
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("http status {status}: {body}")]
    Status {
        /// Status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// WebSocket failure
    #[error("websocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    /// Server answered `connection_init` with `connection_error`
    #[error("connection rejected: {0}")]
    ConnectionRejected(String),

    /// No `connection_ack` within the configured timeout
    #[error("no connection_ack within {}ms", .0.as_millis())]
    AckTimeout(Duration),

    /// WebSocket connection is gone
    #[error("websocket connection closed")]
    ConnectionClosed,

    /// Response carried GraphQL errors
    #[error("graphql errors: {}", .0.join("; "))]
    Graphql(Vec<String>),

    /// Response shape did not match the operation
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Creation response has no identifier
    #[error("no identifier in creation response")]
    MissingIdentifier,

    /// JSON (de)serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphqlError {
    /// Connection-level failure, worth reconnecting for
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::WebSocket(_)
                | Self::ConnectionClosed
                | Self::AckTimeout(_)
                | Self::ConnectionRejected(_)
        )
    }

    /// Configuration problem
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ConfigIo { .. } | Self::ConfigParse(_)
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GraphqlError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(error))
    }
}

impl From<GraphqlError> for BackendError {
    fn from(error: GraphqlError) -> Self {
        match error {
            GraphqlError::Graphql(messages) => Self::Rejected(messages.join("; ")),
            GraphqlError::MissingIdentifier => Self::MissingIdentifier,
            GraphqlError::ConnectionClosed => Self::Closed,
            GraphqlError::MalformedResponse(msg) => Self::MalformedResponse(msg),
            GraphqlError::Json(e) => Self::MalformedResponse(e.to_string()),
            other => Self::transport(other),
        }
    }
}
