//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (limits > 0, timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{AppConfig, PacingMode};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check every semantic rule and collect all failures.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }

    if config.session.client_id.trim().is_empty() {
        errors.push(ValidationError::new("session.client_id", "must not be empty"));
    }
    match url::Url::parse(&config.session.bridge_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "session.bridge_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "session.bridge_url",
            format!("invalid URL '{}': {}", config.session.bridge_url, e),
        )),
    }

    if config.batch.max_numbers == 0 {
        errors.push(ValidationError::new("batch.max_numbers", "must be at least 1"));
    }
    if config.batch.min_digits == 0 {
        errors.push(ValidationError::new("batch.min_digits", "must be at least 1"));
    }
    if config.batch.pacing == PacingMode::TokenBucket {
        if !(config.batch.tokens_per_second > 0.0) {
            errors.push(ValidationError::new(
                "batch.tokens_per_second",
                "must be greater than 0 for token_bucket pacing",
            ));
        }
        if config.batch.burst == 0 {
            errors.push(ValidationError::new(
                "batch.burst",
                "must be at least 1 for token_bucket pacing",
            ));
        }
    }

    if config.shutdown.timeout_ms == 0 {
        errors.push(ValidationError::new("shutdown.timeout_ms", "must be greater than 0"));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
