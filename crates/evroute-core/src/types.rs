//! Core types for the resolution protocol
//!
//! Defines the values that flow through a single `resolve` call:
//! - Resource handles returned by the creation call
//! - Status enumerators and their terminal classification
//! - Status updates carried by the subscription stream
//! - The caller-visible resolution outcome
//! - Per-call options

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identifier returned by the creation call
///
/// Valid for one resolution attempt and never reused across requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    /// Wrap a backend identifier, rejecting empty values
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Status enumerator reported by the backend
///
/// Values outside the known set are kept verbatim in [`ResourceStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceStatus {
    /// Accepted, not yet started
    Pending,
    /// Computation in progress
    Processing,
    /// Computation finished
    Done,
    /// Backend could not produce the resource
    NotFound,
    /// Backend gave up on the computation
    Error,
    /// Any value this client does not recognise
    Unknown(String),
}

impl ResourceStatus {
    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::NotFound => "not_found",
            Self::Error => "error",
            Self::Unknown(raw) => raw,
        }
    }

    /// Classify the status for the resolution state machine
    #[inline]
    #[must_use]
    pub fn phase(&self) -> StatusPhase {
        match self {
            Self::Done => StatusPhase::Succeeded,
            Self::NotFound | Self::Error => StatusPhase::Failed,
            Self::Pending | Self::Processing | Self::Unknown(_) => StatusPhase::InProgress,
        }
    }

    /// Whether observation ends at this status
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self.phase(), StatusPhase::InProgress)
    }
}

impl From<&str> for ResourceStatus {
    fn from(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "processing" | "calculating" => Self::Processing,
            "done" => Self::Done,
            "not_found" => Self::NotFound,
            "error" => Self::Error,
            _ => Self::Unknown(raw.to_string()),
        }
    }
}

impl From<String> for ResourceStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<ResourceStatus> for String {
    fn from(status: ResourceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal classification of a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusPhase {
    /// Keep observing
    InProgress,
    /// Resource is available
    Succeeded,
    /// Resource will never be available
    Failed,
}

/// One message of the status stream
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate<R> {
    /// Reported status
    pub status: ResourceStatus,
    /// Payload, populated once the status is `done`
    pub resource: Option<R>,
}

impl<R> StatusUpdate<R> {
    /// Update without payload
    #[inline]
    #[must_use]
    pub fn new(status: ResourceStatus) -> Self {
        Self {
            status,
            resource: None,
        }
    }

    /// `pending` update
    #[inline]
    #[must_use]
    pub fn pending() -> Self {
        Self::new(ResourceStatus::Pending)
    }

    /// `done` update carrying the resource
    #[inline]
    #[must_use]
    pub fn done(resource: R) -> Self {
        Self {
            status: ResourceStatus::Done,
            resource: Some(resource),
        }
    }

    /// `not_found` update
    #[inline]
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(ResourceStatus::NotFound)
    }

    /// Transform the payload
    pub fn map<T>(self, f: impl FnOnce(R) -> T) -> StatusUpdate<T> {
        StatusUpdate {
            status: self.status,
            resource: self.resource.map(f),
        }
    }
}

/// Outcome of a completed resolution
///
/// `Absent` is a valid terminal outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<R> {
    /// The backend produced the resource
    Resolved(R),
    /// The backend reported a terminal failure status
    Absent {
        /// Handle that was observed
        handle: ResourceHandle,
        /// Status that ended the observation
        status: ResourceStatus,
    },
}

impl<R> Resolution<R> {
    /// Whether a resource was delivered
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Resource, if any
    #[inline]
    #[must_use]
    pub fn into_option(self) -> Option<R> {
        match self {
            Self::Resolved(resource) => Some(resource),
            Self::Absent { .. } => None,
        }
    }

    /// Borrowing variant of [`Resolution::into_option`]
    #[inline]
    #[must_use]
    pub fn as_ref(&self) -> Option<&R> {
        match self {
            Self::Resolved(resource) => Some(resource),
            Self::Absent { .. } => None,
        }
    }
}

/// Per-call resolution options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Give up after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Issue one direct status query after subscribing
    pub verify_with_query: bool,
}

impl ResolveOptions {
    /// Default options: no timeout, no direct query
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// With the direct status query race-breaker
    #[inline]
    #[must_use]
    pub fn with_verify_query(mut self, enabled: bool) -> Self {
        self.verify_with_query = enabled;
        self
    }
}
