//! WhatsApp number checker (v1)
//!
//! An HTTP API in front of a WhatsApp Web automation session.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ http::handlers ──▶ checker ──┐
//!                      (CORS, IDs,      (readiness,       (pacing) │
//!                       body limit)      validation)               ▼
//!                                                        session::MessagingClient
//!                                                                  │
//!                                         session::bridge (HTTP + WebSocket)
//!                                                                  │
//!                                                                  ▼
//!                                                      browser automation sidecar
//!
//!     Cross-cutting: config, observability, resilience, lifecycle
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use wa_checker::config::resolve_config;
use wa_checker::lifecycle::{run_until, signals, Shutdown};
use wa_checker::observability::{logging, metrics};
use wa_checker::session::{BridgeClient, HttpMediaLoader};

#[derive(Parser)]
#[command(name = "wa-checker")]
#[command(about = "HTTP API for checking WhatsApp registration and sending images", long_about = None)]
struct Args {
    /// Path to a TOML config file (falls back to $WA_CHECKER_CONFIG, then defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("wa-checker v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        client_id = %config.session.client_id,
        bridge_url = %config.session.bridge_url,
        shutdown_timeout_ms = config.shutdown.timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let http = reqwest::Client::new();
    let client = Arc::new(BridgeClient::new(&config.session, http.clone())?);
    let media = Arc::new(HttpMediaLoader::new(http));

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(signals::listen(shutdown.clone()));

    run_until(config, client, media, shutdown).await?;
    Ok(())
}
