//! Shutdown coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::resilience::timeouts::race_deadline;
use crate::session::Session;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
/// Only the first trigger is broadcast; later ones are ignored.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    /// Set by the first trigger.
    initiated: AtomicBool,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            initiated: AtomicBool::new(false),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Returns false if shutdown had already
    /// been triggered.
    pub fn trigger(&self) -> bool {
        if self.initiated.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.tx.send(());
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is triggered (returns at once if it already was).
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        if self.is_triggered() {
            return;
        }
        let _ = rx.recv().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// How collaborator teardown ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    Completed,
    /// Teardown reported an error; it is not propagated.
    Failed(String),
    /// Deadline hit first; the teardown call was abandoned.
    TimedOut,
}

/// Race the collaborator's `destroy()` against `deadline`.
///
/// Never fails: errors and timeouts are logged at debug level, since there is
/// nobody left to report them to.
pub async fn teardown_session(session: &Session, deadline: Duration) -> TeardownOutcome {
    tracing::info!(timeout_ms = deadline.as_millis() as u64, "Shutting down gracefully");

    let outcome = match race_deadline(session.client().destroy(), deadline).await {
        Some(Ok(())) => TeardownOutcome::Completed,
        Some(Err(e)) => {
            tracing::debug!(error = %e, "Client teardown failed");
            TeardownOutcome::Failed(e.to_string())
        }
        None => {
            tracing::debug!("Client teardown did not finish before the deadline");
            TeardownOutcome::TimedOut
        }
    };

    tracing::info!("Shutdown complete");
    outcome
}
