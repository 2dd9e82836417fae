//! Backend seam
//!
//! A backend knows how to run the three exchanges the protocol needs:
//! create, subscribe, and a one-shot status query. Transports implement
//! [`ResourceBackend`]; the resolver only ever talks to this trait.

use crate::error::BackendError;
use crate::types::{ResourceHandle, StatusUpdate};
use futures::stream::BoxStream;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Stream of status updates for one handle
pub type UpdateStream<R> = BoxStream<'static, Result<StatusUpdate<R>, BackendError>>;

/// Remote side of a subscription
///
/// Implementations stop server-side delivery. The protocol guarantees a
/// single call per subscription through [`CancelHandle`].
pub trait Unsubscribe: Send + Sync {
    /// Stop delivery for this subscription
    fn unsubscribe(&self);
}

impl<F> Unsubscribe for F
where
    F: Fn() + Send + Sync,
{
    fn unsubscribe(&self) {
        self();
    }
}

/// Idempotent cancellation handle
///
/// Clones share state: the first `cancel` runs the underlying
/// [`Unsubscribe`], every later call is a no-op.
#[derive(Clone)]
pub struct CancelHandle {
    fired: Arc<AtomicBool>,
    inner: Arc<dyn Unsubscribe>,
}

impl CancelHandle {
    /// Wrap an unsubscribe action
    #[inline]
    pub fn new(inner: impl Unsubscribe + 'static) -> Self {
        Self {
            fired: Arc::new(AtomicBool::new(false)),
            inner: Arc::new(inner),
        }
    }

    /// Handle with nothing to release
    #[inline]
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Cancel; returns `true` only for the call that actually unsubscribed
    pub fn cancel(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.inner.unsubscribe();
            true
        } else {
            false
        }
    }

    /// Whether cancellation already happened
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Open subscription: the update stream plus its cancellation handle
///
/// Dropping the subscription cancels it, so an abandoned observation never
/// leaks server-side delivery.
pub struct Subscription<R> {
    updates: UpdateStream<R>,
    cancel: CancelHandle,
}

impl<R> Subscription<R> {
    /// Assemble a subscription
    #[inline]
    pub fn new(updates: UpdateStream<R>, cancel: CancelHandle) -> Self {
        Self { updates, cancel }
    }

    /// Shared cancellation handle
    #[inline]
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Cancel now
    #[inline]
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }
}

impl<R> Stream for Subscription<R> {
    type Item = Result<StatusUpdate<R>, BackendError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.updates.as_mut().poll_next(cx)
    }
}

impl<R> Drop for Subscription<R> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<R> fmt::Debug for Subscription<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

/// Backend for one resource type
#[async_trait::async_trait]
pub trait ResourceBackend: Send + Sync + 'static {
    /// Creation input
    type Request: Send + Sync;
    /// Terminal payload
    type Resource: Send + 'static;

    /// Start the computation and return its handle
    async fn create(&self, request: &Self::Request) -> Result<ResourceHandle, BackendError>;

    /// Open the status stream for a handle
    async fn subscribe(
        &self,
        handle: &ResourceHandle,
    ) -> Result<Subscription<Self::Resource>, BackendError>;

    /// Read the current status once
    async fn query_status(
        &self,
        handle: &ResourceHandle,
    ) -> Result<StatusUpdate<Self::Resource>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::AtomicUsize;

    fn counting_handle() -> (CancelHandle, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = CancelHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (handle, calls)
    }

    #[test]
    fn cancel_is_idempotent_across_clones() {
        let (handle, calls) = counting_handle();
        let other = handle.clone();

        assert!(handle.cancel());
        assert!(!other.cancel());
        assert!(!handle.cancel());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(other.is_cancelled());
    }

    #[tokio::test]
    async fn dropping_subscription_cancels() {
        let (handle, calls) = counting_handle();
        let updates: UpdateStream<u32> = futures::stream::pending().boxed();
        let subscription = Subscription::new(updates, handle);
        drop(subscription);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_subscription_yields_nothing() {
        let (handle, calls) = counting_handle();
        let updates: UpdateStream<u32> =
            futures::stream::iter(vec![Ok(StatusUpdate::pending())]).boxed();
        let mut subscription = Subscription::new(updates, handle);
        subscription.cancel();
        assert!(subscription.next().await.is_none());
        drop(subscription);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
