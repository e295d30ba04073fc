//! Cancellation-bearing execution context.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Execution context handed to every processed event and every send.
///
/// Carries the caller's cancellation token. Cancellation aborts in-progress
/// waits and submissions promptly but never corrupts queue state for
/// subsequent events.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    cancel: CancellationToken,
}

impl ExecContext {
    /// A fresh, never-cancelled context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that aborts when `parent` is cancelled.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self { cancel: parent.child_token() }
    }

    /// Cancel this context and its children.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the context is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}
