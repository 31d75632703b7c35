use std::future::Future;

use tokio::sync::watch;

/// One-shot teardown signal shared by a view and the tasks it spawned.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx,
        }
    }

    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `shutdown` has been called, including calls made before `wait`.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.wait_for(|done| *done).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::Shutdown;

    #[tokio::test]
    async fn test_wait_after_shutdown_resolves() {
        let shutdown = Shutdown::new();
        shutdown.shutdown();
        assert!(shutdown.is_shutdown());
        tokio::time::timeout(Duration::from_millis(100), shutdown.wait()).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_wakes_pending_task() {
        let shutdown = Arc::new(Shutdown::new());
        let waiter = tokio::spawn(shutdown.wait());
        assert!(!shutdown.is_shutdown());
        shutdown.shutdown();
        tokio::time::timeout(Duration::from_millis(500), waiter).await.unwrap().unwrap();
    }
}
