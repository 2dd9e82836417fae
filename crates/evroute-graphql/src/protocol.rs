//! GraphQL request/response bodies and the `graphql-ws` message set
//!
//! Subscriptions use the subscriptions-transport-ws protocol: the client
//! opens with `connection_init`, waits for `connection_ack`, then
//! multiplexes operations by id with `start`/`stop`. The server answers
//! with `data`, `error` and `complete`, and sends `ka` keep-alives.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WebSocket subprotocol name
pub const SUBPROTOCOL: &str = "graphql-ws";

/// Operation sent over HTTP or in a `start` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    /// Document
    pub query: String,
    /// Variables
    #[serde(default)]
    pub variables: Value,
    /// Operation name
    #[serde(
        rename = "operationName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_name: Option<String>,
}

impl GraphqlRequest {
    /// Operation with variables
    #[must_use]
    pub fn new(query: impl Into<String>, variables: Value) -> Self {
        Self {
            query: query.into(),
            variables,
            operation_name: None,
        }
    }

    /// With operation name
    #[inline]
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// One entry of a response's `errors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Human-readable message
    pub message: String,
}

/// Response body of an operation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphqlResponse {
    /// Selected data
    #[serde(default)]
    pub data: Option<Value>,
    /// Errors, if any
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

impl GraphqlResponse {
    /// Error messages
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

/// Client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open the session with authentication headers
    ConnectionInit {
        /// Header map
        payload: Value,
    },
    /// Start an operation
    Start {
        /// Operation id
        id: String,
        /// Operation
        payload: GraphqlRequest,
    },
    /// Stop an operation
    Stop {
        /// Operation id
        id: String,
    },
    /// Close the session
    ConnectionTerminate,
}

/// Server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Session accepted
    ConnectionAck,
    /// Session rejected
    ConnectionError {
        /// Reason
        #[serde(default)]
        payload: Value,
    },
    /// Keep-alive
    Ka,
    /// Operation result
    Data {
        /// Operation id
        id: String,
        /// Result
        payload: GraphqlResponse,
    },
    /// Operation failed before producing data
    Error {
        /// Operation id
        id: String,
        /// Error details
        #[serde(default)]
        payload: Value,
    },
    /// Operation finished
    Complete {
        /// Operation id
        id: String,
    },
    /// Anything this client does not understand
    #[serde(other)]
    Unknown,
}

/// Best-effort text of an error payload
#[must_use]
pub fn describe_payload(payload: &Value) -> String {
    match payload {
        Value::Null => "no details".to_string(),
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| payload.to_string(), str::to_string),
        Value::Array(items) => items
            .iter()
            .map(describe_payload)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}
