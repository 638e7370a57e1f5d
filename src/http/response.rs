//! Response bodies.
//!
//! # Responsibilities
//! - Define the JSON shapes returned by each endpoint
//! - Stamp every body with an RFC 3339 UTC timestamp
//!
//! # Design Decisions
//! - Field names are camelCase on the wire
//! - Timestamps use millisecond precision with a `Z` suffix

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::checker::CheckResult;

/// Current time, e.g. `2024-05-01T12:00:00.000Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub whatsapp_ready: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub is_ready: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckNumberResponse {
    pub success: bool,
    pub number: String,
    pub is_registered: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct CheckNumbersResponse {
    pub success: bool,
    pub total: usize,
    pub results: Vec<CheckResult>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendImageResponse {
    pub success: bool,
    pub number: String,
    pub image_url: String,
    pub message: String,
    pub timestamp: String,
}
