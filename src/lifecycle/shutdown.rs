//! Shutdown coordination.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that the server and any background task can
/// subscribe to.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Wake every subscriber. Calling it again is harmless.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of subscribers still waiting.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Wait for `task` to finish, giving up after `grace` once shutdown has
    /// been triggered.
    ///
    /// Returns `None` when the grace period ran out first.
    pub async fn drain<F>(&self, task: F, grace: Duration) -> Option<F::Output>
    where
        F: Future,
    {
        let mut rx = self.subscribe();
        tokio::pin!(task);

        tokio::select! {
            output = &mut task => return Some(output),
            _ = rx.recv() => {}
        }

        match tokio::time::timeout(grace, task).await {
            Ok(output) => Some(output),
            Err(_) => {
                tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, forcing exit");
                None
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
