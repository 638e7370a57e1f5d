//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGINT, SIGTERM)
//! - Translate the first signal into a shutdown trigger
//! - Absorb repeated signals while shutdown is running
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers stay installed, so a second Ctrl+C cannot kill the process
//!   halfway through teardown

use std::sync::Arc;

use crate::lifecycle::shutdown::Shutdown;

/// Route one received signal to `shutdown`. Returns true if it started the
/// shutdown sequence.
pub fn on_signal(shutdown: &Shutdown, signal: &'static str) -> bool {
    if shutdown.trigger() {
        tracing::info!(signal, "Shutdown signal received");
        true
    } else {
        tracing::debug!(signal, "Shutdown already in progress, ignoring signal");
        false
    }
}

/// Listen for termination signals for the rest of the process lifetime.
pub async fn listen(shutdown: Arc<Shutdown>) {
    #[cfg(unix)]
    let mut terminate = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            None
        }
    };

    loop {
        #[cfg(unix)]
        let terminated = async {
            match terminate.as_mut() {
                Some(stream) => {
                    if stream.recv().await.is_none() {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        #[cfg(not(unix))]
        let terminated = std::future::pending::<()>();

        let signal = tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => "SIGINT",
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                    return;
                }
            },
            _ = terminated => "SIGTERM",
        };

        on_signal(&shutdown, signal);
    }
}
