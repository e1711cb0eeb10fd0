//! Shared cancellation primitive (spec §5 "Cancellation & timeout").
//!
//! Lives in `provisioner-domain` rather than `provisioner-workflow-engine`
//! so that lower-level adapters (C5 fleet polling, C8 firmware reboot
//! polling) can observe it without a dependency cycle back onto the engine
//! crate that orchestrates them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

/// Shared, cloneable cancellation flag. Checked at every step boundary and
/// raced against long adapter waits so cancellation is observable mid-step.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, returning early with `true` if cancelled
    /// while waiting. Used by retryable-step backoff and by any adapter
    /// poll loop that wants to stay cancellation-aware.
    pub async fn cancellable_sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => self.is_cancelled(),
            () = self.notify.notified() => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancellable_sleep_returns_promptly_once_cancelled() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancellable_sleep(Duration::from_secs(60)).await });

        token.cancel();
        let cancelled = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancellable_sleep did not return promptly")
            .expect("task panicked");
        assert!(cancelled);
    }

    #[tokio::test]
    async fn cancellable_sleep_returns_false_when_not_cancelled() {
        let token = CancellationToken::new();
        let cancelled = token.cancellable_sleep(Duration::from_millis(10)).await;
        assert!(!cancelled);
    }
}
