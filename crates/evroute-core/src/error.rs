//! Error types for the resolution protocol
//!
//! Two layers:
//! - `BackendError` describes what went wrong in a single exchange with the backend
//! - `ResolveError` is what a `resolve` caller sees
//!
//! A `not_found` status is not an error; it surfaces as `Resolution::Absent`.

use crate::types::ResourceHandle;
use std::time::Duration;

/// Failure of one backend exchange
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Network or protocol failure below the API layer
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Creation response carried no usable identifier
    #[error("response did not contain a resource identifier")]
    MissingIdentifier,

    /// Backend reported errors for the operation
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// Stream or connection closed by the remote side
    #[error("connection closed")]
    Closed,
}

impl BackendError {
    /// Wrap any transport-level error
    #[inline]
    pub fn transport(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(error))
    }

    /// Whether the failure happened below the API layer
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Closed)
    }
}

/// Failure of a `resolve` call
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The creation call did not yield a handle; no subscription was opened
    #[error("creation failed: {0}")]
    CreationFailed(#[source] BackendError),

    /// The status stream ended before a terminal status
    #[error("status stream for {handle} closed before a terminal status: {reason}")]
    StreamClosed {
        /// Handle being observed
        handle: ResourceHandle,
        /// What ended the stream
        reason: String,
    },

    /// Caller-supplied timeout elapsed
    #[error("resolution of {handle} timed out after {}ms", after.as_millis())]
    Timeout {
        /// Handle being observed
        handle: ResourceHandle,
        /// Configured timeout
        after: Duration,
    },
}

impl ResolveError {
    /// Build a `StreamClosed` error
    #[inline]
    pub fn stream_closed(handle: &ResourceHandle, reason: impl Into<String>) -> Self {
        Self::StreamClosed {
            handle: handle.clone(),
            reason: reason.into(),
        }
    }

    /// Handle involved, if one was obtained
    #[inline]
    #[must_use]
    pub fn handle(&self) -> Option<&ResourceHandle> {
        match self {
            Self::CreationFailed(_) => None,
            Self::StreamClosed { handle, .. } | Self::Timeout { handle, .. } => Some(handle),
        }
    }

    /// Check if a caller could reasonably try again
    ///
    /// The protocol itself never retries.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CreationFailed(source) => source.is_transport(),
            Self::StreamClosed { .. } | Self::Timeout { .. } => true,
        }
    }
}
