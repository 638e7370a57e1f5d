//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wa_requests_total` (counter): requests by endpoint, status
//! - `wa_request_duration_seconds` (histogram): latency by endpoint
//! - `wa_registration_checks_total` (counter): lookups by outcome
//! - `wa_messages_sent_total` (counter): image sends by outcome
//! - `wa_session_ready` (gauge): 1=ready, 0=not ready
//!
//! Recording is a no-op until a recorder is installed, so handlers call
//! these unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with a scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter"),
    }
}

/// Record a finished HTTP request.
pub fn record_request(endpoint: &'static str, status: u16, started: Instant) {
    metrics::counter!(
        "wa_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("wa_request_duration_seconds", "endpoint" => endpoint)
        .record(started.elapsed().as_secs_f64());
}

/// Outcome of a single registration lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Registered,
    Unregistered,
    Error,
}

impl CheckOutcome {
    fn as_str(self) -> &'static str {
        match self {
            CheckOutcome::Registered => "registered",
            CheckOutcome::Unregistered => "unregistered",
            CheckOutcome::Error => "error",
        }
    }
}

pub fn record_registration_check(outcome: CheckOutcome) {
    metrics::counter!("wa_registration_checks_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_message_sent(ok: bool) {
    let outcome = if ok { "sent" } else { "error" };
    metrics::counter!("wa_messages_sent_total", "outcome" => outcome).increment(1);
}

pub fn set_session_ready(ready: bool) {
    metrics::gauge!("wa_session_ready").set(if ready { 1.0 } else { 0.0 });
}
