//! Registration checks, single and batched.
//!
//! # Responsibilities
//! - Validate and normalise numbers before any collaborator call
//! - Run batch lookups strictly in input order, one at a time
//! - Pause after each lookup via the configured [`Pacer`]
//! - Isolate per-item failures so one bad number never aborts a batch

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::observability::metrics::{self, CheckOutcome};
use crate::phone::PhoneNumber;
use crate::resilience::Pacer;
use crate::session::{ClientError, MessagingClient};

/// Per-item message for batch elements that are not strings.
pub const NOT_A_STRING: &str = "Phone number must be a string";

/// Outcome of checking one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Cleaned digits on success, the caller's original input on error.
    pub number: String,
    pub is_registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn checked(number: &PhoneNumber, is_registered: bool) -> Self {
        Self {
            number: number.digits().to_string(),
            is_registered,
            error: None,
        }
    }

    fn failed(original: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            number: original.into(),
            is_registered: false,
            error: Some(error.into()),
        }
    }
}

/// Runs registration lookups against the collaborator.
pub struct Checker {
    client: Arc<dyn MessagingClient>,
    pacer: Arc<dyn Pacer>,
    min_digits: usize,
}

impl Checker {
    pub fn new(client: Arc<dyn MessagingClient>, pacer: Arc<dyn Pacer>, min_digits: usize) -> Self {
        Self {
            client,
            pacer,
            min_digits,
        }
    }

    pub fn min_digits(&self) -> usize {
        self.min_digits
    }

    /// Look up one already-validated number.
    pub async fn lookup(&self, number: &PhoneNumber) -> Result<bool, ClientError> {
        let result = self.client.is_registered_user(&number.user_id()).await;
        metrics::record_registration_check(match &result {
            Ok(true) => CheckOutcome::Registered,
            Ok(false) => CheckOutcome::Unregistered,
            Err(_) => CheckOutcome::Error,
        });
        result
    }

    /// Check every item in order. Always yields one result per item.
    pub async fn check_batch(&self, items: &[Value]) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let raw = match item {
                Value::String(raw) => raw,
                other => {
                    results.push(CheckResult::failed(other.to_string(), NOT_A_STRING));
                    continue;
                }
            };

            let number = match PhoneNumber::parse(raw, self.min_digits) {
                Ok(number) => number,
                Err(e) => {
                    results.push(CheckResult::failed(raw.as_str(), e.to_string()));
                    continue;
                }
            };

            match self.lookup(&number).await {
                Ok(is_registered) => {
                    results.push(CheckResult::checked(&number, is_registered));
                    self.pacer.pause().await;
                }
                Err(e) => {
                    tracing::warn!(index, number = %number, error = %e, "Batch lookup failed");
                    results.push(CheckResult::failed(raw.as_str(), e.to_string()));
                }
            }
        }

        results
    }
}
