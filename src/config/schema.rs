//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the checker service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Collaborator session settings.
    pub session: SessionConfig,

    /// Batch verification settings.
    pub batch: BatchConfig,

    /// Shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Collaborator session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Identifier the collaborator keys its persisted auth profile on.
    pub client_id: String,

    /// Base URL of the browser-automation bridge.
    pub bridge_url: String,

    /// Per-call timeout against the bridge in seconds (0 = no timeout).
    pub request_timeout_secs: u64,

    /// Flags passed to the headless browser.
    pub browser_args: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_id: "whatsapp-checker".to_string(),
            bridge_url: "http://127.0.0.1:3100".to_string(),
            request_timeout_secs: 0,
            browser_args: [
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--disable-accelerated-2d-canvas",
                "--no-first-run",
                "--no-zygote",
                "--disable-gpu",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Pacing policy applied between collaborator calls in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// Sleep a fixed delay after every checked number.
    Fixed,
    /// Token bucket shared by all batches.
    TokenBucket,
    /// No pacing.
    None,
}

/// Batch verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum numbers accepted per batch request.
    pub max_numbers: usize,

    /// Minimum digits a cleaned number must have.
    pub min_digits: usize,

    /// Pacing policy.
    pub pacing: PacingMode,

    /// Delay after each checked number for `fixed` pacing, in milliseconds.
    pub item_delay_ms: u64,

    /// Refill rate for `token_bucket` pacing.
    pub tokens_per_second: f64,

    /// Bucket capacity for `token_bucket` pacing.
    pub burst: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_numbers: 50,
            min_digits: 10,
            pacing: PacingMode::Fixed,
            item_delay_ms: 500,
            tokens_per_second: 2.0,
            burst: 1,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Upper bound on collaborator teardown in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { timeout_ms: 3000 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
