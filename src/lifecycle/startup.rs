//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener before anything else (fail fast on a taken port)
//! - Start serving, then kick off collaborator initialization
//! - Wait for shutdown, then tear the collaborator down under a deadline
//!
//! # Design Decisions
//! - The server answers `/health` and `/status` while the client is still
//!   initializing; business endpoints refuse until it is ready
//! - The server task is not awaited after shutdown, so a stuck in-flight
//!   request cannot hold the process open past the teardown deadline

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::{teardown_session, Shutdown, TeardownOutcome};
use crate::session::{MediaLoader, MessagingClient, Session};

/// Routes listed in the startup banner.
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("GET", "/health"),
    ("GET", "/status"),
    ("POST", "/check-number"),
    ("POST", "/check-numbers"),
    ("POST", "/send-image"),
];

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Bind `listener.bind_address` and run the service until `shutdown` fires.
///
/// Returns how collaborator teardown ended. Signal handling is the caller's
/// job; see [`crate::lifecycle::signals::listen`].
pub async fn run_until(
    config: AppConfig,
    client: Arc<dyn MessagingClient>,
    media: Arc<dyn MediaLoader>,
    shutdown: Arc<Shutdown>,
) -> Result<TeardownOutcome, StartupError> {
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    serve_until(listener, config, client, media, shutdown).await
}

/// Like [`run_until`] on an already bound listener.
pub async fn serve_until(
    listener: TcpListener,
    config: AppConfig,
    client: Arc<dyn MessagingClient>,
    media: Arc<dyn MediaLoader>,
    shutdown: Arc<Shutdown>,
) -> Result<TeardownOutcome, StartupError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "WhatsApp checker API listening");
    }
    for (method, path) in ENDPOINTS {
        tracing::info!(method, path, "Endpoint available");
    }

    let deadline = Duration::from_millis(config.shutdown.timeout_ms);
    let session = Session::new(client);
    let server = HttpServer::new(config, session.clone(), media);

    let server_shutdown = shutdown.subscribe();
    let mut server_task = tokio::spawn(server.run(listener, server_shutdown));

    tracing::info!("Initializing WhatsApp client");
    session.start();

    let mut serve_error = None;
    tokio::select! {
        _ = shutdown.wait() => {}
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => tracing::warn!("HTTP server exited before shutdown"),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "HTTP server failed");
                    serve_error = Some(e);
                }
                Err(e) => tracing::error!(error = %e, "HTTP server task panicked"),
            }
            shutdown.trigger();
        }
    }

    let outcome = teardown_session(&session, deadline).await;

    match serve_error {
        Some(e) => Err(StartupError::Serve(e)),
        None => Ok(outcome),
    }
}
