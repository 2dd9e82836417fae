//! Resolver
//!
//! Turns a creation request plus a server-push status stream into a single
//! outcome:
//! 1. Create the resource and obtain its handle
//! 2. Subscribe to status updates for the handle
//! 3. Optionally query the status once, racing the subscription
//! 4. Publish the first terminal observation, cancel the subscription, and
//!    return it to the caller
//!
//! No retries and no reconnects happen here; transports own that.

use crate::backend::{CancelHandle, ResourceBackend, Subscription};
use crate::completion::{CompletionSlot, CompletionSource};
use crate::error::ResolveError;
use crate::state::{PhaseTracker, ResolvePhase};
use crate::types::{
    Resolution, ResolveOptions, ResourceHandle, ResourceStatus, StatusPhase, StatusUpdate,
};
use futures::StreamExt;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

type Outcome<R> = Result<Resolution<R>, ResolveError>;

/// Counters across all `resolve` calls of one resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Calls started
    pub started: u64,
    /// Calls that delivered a resource
    pub resolved: u64,
    /// Calls that ended with a terminal failure status
    pub absent: u64,
    /// Calls that returned an error
    pub failed: u64,
    /// Outcomes published by the direct status query
    pub won_by_query: u64,
}

/// Drives the create / subscribe / resolve protocol against a backend
///
/// Cheap to clone; clones share the backend and the statistics.
pub struct Resolver<B: ResourceBackend> {
    backend: Arc<B>,
    options: ResolveOptions,
    stats: Arc<Mutex<ResolverStats>>,
}

impl<B: ResourceBackend> Resolver<B> {
    /// Create a resolver with default options
    #[inline]
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            options: ResolveOptions::default(),
            stats: Arc::new(Mutex::new(ResolverStats::default())),
        }
    }

    /// With default options for every call
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Shared backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Default options
    #[inline]
    #[must_use]
    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// Snapshot of the counters
    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        *self.stats.lock()
    }

    /// Resolve with the resolver's default options
    ///
    /// # Errors
    /// - `ResolveError::CreationFailed` if no handle was obtained
    /// - `ResolveError::StreamClosed` if the stream ended before a terminal status
    /// - `ResolveError::Timeout` if the configured timeout elapsed
    pub async fn resolve(&self, request: &B::Request) -> Outcome<B::Resource> {
        self.resolve_with(request, self.options).await
    }

    /// Resolve with explicit options
    ///
    /// # Errors
    /// See [`Resolver::resolve`].
    pub async fn resolve_with(
        &self,
        request: &B::Request,
        options: ResolveOptions,
    ) -> Outcome<B::Resource> {
        self.stats.lock().started += 1;
        let started = Instant::now();
        let mut phase = PhaseTracker::new();

        let outcome = self.run(request, options, &mut phase).await;

        let mut stats = self.stats.lock();
        match &outcome {
            Ok(Resolution::Resolved(_)) => {
                stats.resolved += 1;
                tracing::info!(elapsed_ms = started.elapsed().as_millis(), "resource resolved");
            }
            Ok(Resolution::Absent { handle, status }) => {
                stats.absent += 1;
                tracing::info!(%handle, %status, "resource not available");
            }
            Err(e) => {
                stats.failed += 1;
                tracing::error!(phase = %phase.current(), "resolution failed: {e}");
            }
        }

        outcome
    }

    async fn run(
        &self,
        request: &B::Request,
        options: ResolveOptions,
        phase: &mut PhaseTracker,
    ) -> Outcome<B::Resource> {
        let handle = match self.backend.create(request).await {
            Ok(handle) => handle,
            Err(e) => {
                phase.advance(ResolvePhase::CreationFailed);
                return Err(ResolveError::CreationFailed(e));
            }
        };
        tracing::info!(%handle, "resource created");

        let subscription = match self.backend.subscribe(&handle).await {
            Ok(subscription) => subscription,
            Err(e) => {
                phase.advance(ResolvePhase::StreamClosed);
                return Err(ResolveError::stream_closed(&handle, e.to_string()));
            }
        };
        phase.advance(ResolvePhase::Subscribed);

        let cancel = subscription.cancel_handle();
        let (slot, rx) = CompletionSlot::channel();
        let slot = Arc::new(slot);

        let watcher = tokio::spawn(watch_subscription(
            handle.clone(),
            subscription,
            Arc::clone(&slot),
        ));
        let verifier = options.verify_with_query.then(|| {
            tokio::spawn(verify_once(
                Arc::clone(&self.backend),
                handle.clone(),
                cancel.clone(),
                Arc::clone(&slot),
            ))
        });

        let received = match options.timeout {
            Some(after) => tokio::time::timeout(after, rx).await.ok(),
            None => Some(rx.await),
        };

        cancel.cancel();
        watcher.abort();
        if let Some(verifier) = verifier {
            verifier.abort();
        }

        let outcome = match received {
            None => {
                phase.advance(ResolvePhase::TimedOut);
                return Err(ResolveError::Timeout {
                    handle,
                    after: options.timeout.unwrap_or_default(),
                });
            }
            Some(Err(_)) => Err(ResolveError::stream_closed(
                &handle,
                "observer stopped without an outcome",
            )),
            Some(Ok((source, outcome))) => {
                if source == CompletionSource::DirectQuery {
                    self.stats.lock().won_by_query += 1;
                }
                tracing::debug!(%handle, ?source, "outcome published");
                outcome
            }
        };

        phase.advance(match &outcome {
            Ok(Resolution::Resolved(_)) => ResolvePhase::Resolved,
            Ok(Resolution::Absent { .. }) => ResolvePhase::Absent,
            Err(ResolveError::Timeout { .. }) => ResolvePhase::TimedOut,
            Err(_) => ResolvePhase::StreamClosed,
        });
        outcome
    }
}

impl<B: ResourceBackend> Clone for Resolver<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            options: self.options,
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<B: ResourceBackend> fmt::Debug for Resolver<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("options", &self.options)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Map a status update to an outcome if it is terminal
fn classify<R>(handle: &ResourceHandle, update: StatusUpdate<R>) -> Option<Outcome<R>> {
    let StatusUpdate { status, resource } = update;
    match status.phase() {
        StatusPhase::Succeeded => match resource {
            Some(resource) => Some(Ok(Resolution::Resolved(resource))),
            None => {
                tracing::warn!(%handle, "status done without payload, still waiting");
                None
            }
        },
        StatusPhase::Failed => Some(Ok(Resolution::Absent {
            handle: handle.clone(),
            status,
        })),
        StatusPhase::InProgress => {
            if let ResourceStatus::Unknown(raw) = &status {
                tracing::warn!(%handle, status = %raw, "unrecognised status treated as in progress");
            } else {
                tracing::debug!(%handle, %status, "status update");
            }
            None
        }
    }
}

async fn watch_subscription<R: Send + 'static>(
    handle: ResourceHandle,
    mut subscription: Subscription<R>,
    slot: Arc<CompletionSlot<Outcome<R>>>,
) {
    while let Some(item) = subscription.next().await {
        if slot.is_completed() {
            return;
        }
        match item {
            Ok(update) => {
                if let Some(outcome) = classify(&handle, update) {
                    slot.complete(CompletionSource::Subscription, outcome);
                    subscription.cancel();
                    return;
                }
            }
            Err(e) => {
                if !subscription.cancel_handle().is_cancelled() {
                    slot.complete(
                        CompletionSource::Subscription,
                        Err(ResolveError::stream_closed(&handle, e.to_string())),
                    );
                }
                return;
            }
        }
    }
    // An end caused by our own cancellation is not a failure; the outcome
    // was published before the cancel.
    if subscription.cancel_handle().is_cancelled() {
        return;
    }
    slot.complete(
        CompletionSource::Subscription,
        Err(ResolveError::stream_closed(&handle, "stream ended")),
    );
}

async fn verify_once<B: ResourceBackend>(
    backend: Arc<B>,
    handle: ResourceHandle,
    cancel: CancelHandle,
    slot: Arc<CompletionSlot<Outcome<B::Resource>>>,
) {
    let update = match backend.query_status(&handle).await {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(%handle, "direct status query failed, relying on subscription: {e}");
            return;
        }
    };

    if let Some(outcome) = classify(&handle, update) {
        if slot.complete(CompletionSource::DirectQuery, outcome) {
            cancel.cancel();
            tracing::debug!(%handle, "direct status query observed the terminal status first");
        }
    }
}
