//! Coordinated shutdown
//!
//! One cancellation signal shared by every listener loop, observed before
//! and after each blocking accept/receive, plus a drain mechanism that
//! waits a bounded interval for in-flight worker tasks to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Owns the drain side of shutdown
///
/// Created once at process start. Listeners and workers interact with
/// shutdown only through [`ShutdownHandle`] clones.
pub struct ShutdownCoordinator {
    handle: ShutdownHandle,
    drain_rx: mpsc::Receiver<()>,
}

/// Clonable view of the shutdown signal
///
/// Every clone carries a drain sender, so a component that holds a handle
/// for its whole lifetime is automatically accounted for by
/// [`ShutdownCoordinator::drain`].
#[derive(Clone)]
pub struct ShutdownHandle {
    token: CancellationToken,
    initiated: Arc<AtomicBool>,
    drain_tx: mpsc::Sender<()>,
}

/// RAII guard held by a worker task for its whole lifetime
///
/// The coordinator's drain completes once every guard (and every handle)
/// has been dropped.
pub struct TaskGuard {
    _drain_tx: mpsc::Sender<()>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (drain_tx, drain_rx) = mpsc::channel(1);
        ShutdownCoordinator {
            handle: ShutdownHandle {
                token: CancellationToken::new(),
                initiated: Arc::new(AtomicBool::new(false)),
                drain_tx,
            },
            drain_rx,
        }
    }

    /// Get a handle for a listener, worker, or signal source
    pub fn handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    /// Wait until all handles and task guards are dropped, up to `limit`
    ///
    /// Returns false when the window expired with tasks still in flight;
    /// those tasks are abandoned to die with the process.
    pub async fn drain(self, limit: Duration) -> bool {
        let ShutdownCoordinator {
            handle,
            mut drain_rx,
        } = self;
        // The coordinator's own sender must not hold the channel open
        drop(handle);

        match timeout(limit, drain_rx.recv()).await {
            Ok(_) => {
                info!("All in-flight work drained");
                true
            }
            Err(_) => {
                warn!("Drain window of {:?} expired, abandoning in-flight tasks", limit);
                false
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    /// Set the shutdown flag and wake every blocked listener
    ///
    /// Idempotent; the flag transitions false to true exactly once.
    pub fn initiate(&self) {
        if !self.initiated.swap(true, Ordering::SeqCst) {
            info!("Shutdown initiated");
            self.token.cancel();
        }
    }

    /// Whether shutdown has been initiated
    pub fn is_triggered(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown is initiated
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Mint a guard tying a worker task's lifetime to the drain
    pub fn task_guard(&self) -> TaskGuard {
        TaskGuard {
            _drain_tx: self.drain_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_initiate_is_idempotent() {
        let coordinator = ShutdownCoordinator::new();
        let handle = coordinator.handle();

        assert!(!handle.is_triggered());
        handle.initiate();
        handle.initiate();
        assert!(handle.is_triggered());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiters() {
        let coordinator = ShutdownCoordinator::new();
        let handle = coordinator.handle();
        let waiter = coordinator.handle();

        let waiting = tokio::spawn(async move { waiter.cancelled().await });
        handle.initiate();
        assert_ok!(waiting.await);
    }

    #[tokio::test]
    async fn test_drain_completes_when_tasks_finish() {
        let coordinator = ShutdownCoordinator::new();
        let handle = coordinator.handle();
        let guard = handle.task_guard();
        drop(handle);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(guard);
        });

        assert!(coordinator.drain(Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_drain_reports_expiry() {
        let coordinator = ShutdownCoordinator::new();
        let handle = coordinator.handle();
        let _guard = handle.task_guard();
        drop(handle);

        assert!(!coordinator.drain(Duration::from_millis(20)).await);
    }
}
