//! HTTP error handling and response formatting.
//!
//! Every failure leaves a handler as an [`ApiError`], which renders as
//! `{success:false, error, timestamp}` plus the endpoint's extra field.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::http::response::timestamp;
use crate::session::{ClientError, MediaError};

const INTERNAL: &str = "Internal server error";

/// Failures surfaced to API callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Session not ready (503).
    #[error("WhatsApp client is not ready. Please scan QR code first.")]
    NotReady,

    /// Missing or malformed input (400).
    #[error("{0}")]
    BadRequest(String),

    /// Target not on the network (404).
    #[error("{0}")]
    NotFound(String),

    /// Collaborator or network failure (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attach the endpoint-specific error shape.
    pub fn with_shape(self, shape: ErrorShape) -> ShapedError {
        ShapedError { error: self, shape }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Internal(message) if message.is_empty() => INTERNAL.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(e: ClientError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Extra field each endpoint carries on its error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorShape {
    Plain,
    /// `isRegistered: false`
    Registration,
    /// `results: []`
    Batch,
}

/// An [`ApiError`] bound to an endpoint's error shape.
#[derive(Debug)]
pub struct ShapedError {
    error: ApiError,
    shape: ErrorShape,
}

impl ShapedError {
    pub fn status(&self) -> StatusCode {
        self.error.status()
    }

    pub fn body(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.error.message(),
            "timestamp": timestamp(),
        });
        match self.shape {
            ErrorShape::Plain => {}
            ErrorShape::Registration => body["isRegistered"] = Value::Bool(false),
            ErrorShape::Batch => body["results"] = Value::Array(Vec::new()),
        }
        body
    }
}

impl IntoResponse for ShapedError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self.error, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self.error, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.with_shape(ErrorShape::Plain).into_response()
    }
}
