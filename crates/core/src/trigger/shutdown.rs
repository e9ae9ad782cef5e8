use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Cooperative cancellation shared by the trigger and the submission loop.
///
/// Once triggered it stays triggered; late subscribers see it immediately.
#[derive(Clone)]
pub struct Shutdown {
    fired: Arc<AtomicBool>,
    tx: broadcast::Sender<()>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shutdown")
            .field("fired", &self.is_triggered())
            .finish()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            fired: Arc::new(AtomicBool::new(false)),
            tx,
        }
    }

    pub fn trigger(&self) {
        self.fired.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been triggered.
    pub async fn cancelled(&self) {
        // subscribe before checking the flag so a concurrent trigger is not missed
        let mut rx = self.tx.subscribe();
        if self.is_triggered() {
            return;
        }
        // self holds the sender, so the channel never closes underneath us
        let _ = rx.recv().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancelled_after_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        // already triggered: resolves immediately
        tokio::time::timeout(Duration::from_millis(100), shutdown.cancelled())
            .await
            .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_trigger_wakes_pending_future() {
        let shutdown = Shutdown::new();
        let mut cancelled = tokio_test::task::spawn(shutdown.cancelled());

        tokio_test::assert_pending!(cancelled.poll());
        shutdown.trigger();
        assert!(cancelled.is_woken());
        tokio_test::assert_ready!(cancelled.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_untriggered_stays_pending() {
        let shutdown = Shutdown::new();
        let result = tokio::time::timeout(Duration::from_secs(5), shutdown.cancelled()).await;
        assert!(result.is_err());
    }
}
