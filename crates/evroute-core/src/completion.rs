//! Single-assignment completion slot
//!
//! Several observers (the subscription task, the direct status query) may
//! reach a terminal status for the same handle. The slot lets exactly one
//! of them publish the outcome; every later attempt is rejected and the
//! caller of `resolve` sees a single value.

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Who published the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    /// Status update from the subscription stream
    Subscription,
    /// One-shot status query
    DirectQuery,
}

/// Write-once slot feeding a oneshot receiver
#[derive(Debug)]
pub struct CompletionSlot<T> {
    sender: Mutex<Option<oneshot::Sender<(CompletionSource, T)>>>,
}

impl<T> CompletionSlot<T> {
    /// Create the slot and the receiving end
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<(CompletionSource, T)>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Publish a value; returns `false` if another writer got there first
    pub fn complete(&self, source: CompletionSource, value: T) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            return false;
        };
        // Receiver gone means the caller stopped waiting (timeout); the slot
        // is still consumed.
        sender.send((source, value)).is_ok()
    }

    /// Whether a value has been published or the slot was closed
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.sender.lock().is_none()
    }
}
