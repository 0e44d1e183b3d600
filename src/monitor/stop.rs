//! Monotonic shutdown flag shared by the orchestrator and all workers.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Set-once flag observed cooperatively at every worker checkpoint.
///
/// Backed by a `watch` channel so waiters can also be woken the moment it is set.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the signal. Returns true only for the call that actually set it.
    pub fn trigger(&self) -> bool {
        let first = self.tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        });
        if first {
            info!("Stop signal raised");
        }
        first
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal is set (immediately if it already is)
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_initially_clear() {
        assert!(!StopSignal::new().is_set());
    }

    #[test]
    fn test_trigger_is_set_once() {
        let stop = StopSignal::new();
        assert!(stop.trigger());
        assert!(!stop.trigger());
        assert!(stop.is_set());
    }

    #[test]
    fn test_clone_shares_state() {
        let stop = StopSignal::new();
        let other = stop.clone();
        stop.trigger();
        assert!(other.is_set());
    }

    #[tokio::test]
    async fn test_wait_wakes_on_trigger() {
        let stop = StopSignal::new();
        let waiter = {
            let stop = stop.clone();
            tokio::spawn(async move { stop.wait().await })
        };
        tokio::task::yield_now().await;
        stop.trigger();
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_already_set() {
        let stop = StopSignal::new();
        stop.trigger();
        let waited = tokio::time::timeout(Duration::from_millis(50), stop.wait()).await;
        assert!(waited.is_ok());
    }
}
