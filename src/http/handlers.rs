//! Endpoint handlers.
//!
//! Every business handler checks readiness first, then validates input, and
//! only then touches the collaborator. Readiness can drop between requests,
//! so it is read per request rather than gated by middleware.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::http::error::{ApiError, ErrorShape, ShapedError};
use crate::http::response::{
    timestamp, CheckNumberResponse, CheckNumbersResponse, HealthResponse, SendImageResponse,
    StatusResponse,
};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::phone::PhoneNumber;
use crate::session::{MediaOptions, SendOptions};

#[derive(Debug, Deserialize)]
pub struct CheckNumberRequest {
    pub number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckNumbersRequest {
    pub numbers: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendImageRequest {
    pub number: Option<String>,
    pub image_url: Option<String>,
    pub message: Option<String>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        whatsapp_ready: state.session.is_ready(),
        timestamp: timestamp(),
    })
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        is_ready: state.session.is_ready(),
        timestamp: timestamp(),
    })
}

pub async fn check_number(
    State(state): State<AppState>,
    body: Result<Json<CheckNumberRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let result = check_number_inner(&state, body)
        .await
        .map_err(|e| e.with_shape(ErrorShape::Registration));
    finish("check_number", started, result)
}

async fn check_number_inner(
    state: &AppState,
    body: Result<Json<CheckNumberRequest>, JsonRejection>,
) -> Result<CheckNumberResponse, ApiError> {
    ensure_ready(state)?;
    let Json(request) = body.map_err(reject)?;

    let raw = required(request.number, "Phone number is required")?;
    let number = PhoneNumber::parse(&raw, state.checker.min_digits())
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let is_registered = state.checker.lookup(&number).await?;

    tracing::info!(number = %number, is_registered, "Number checked");
    Ok(CheckNumberResponse {
        success: true,
        number: number.digits().to_string(),
        is_registered,
        timestamp: timestamp(),
    })
}

pub async fn check_numbers(
    State(state): State<AppState>,
    body: Result<Json<CheckNumbersRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let result = check_numbers_inner(&state, body)
        .await
        .map_err(|e| e.with_shape(ErrorShape::Batch));
    finish("check_numbers", started, result)
}

async fn check_numbers_inner(
    state: &AppState,
    body: Result<Json<CheckNumbersRequest>, JsonRejection>,
) -> Result<CheckNumbersResponse, ApiError> {
    ensure_ready(state)?;
    let Json(request) = body.map_err(reject)?;

    let numbers = match request.numbers {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(ApiError::bad_request("An array of phone numbers is required")),
    };
    if numbers.len() > state.max_numbers {
        return Err(ApiError::bad_request(format!(
            "Maximum {} numbers allowed per request",
            state.max_numbers
        )));
    }

    let results = state.checker.check_batch(&numbers).await;

    tracing::info!(
        total = numbers.len(),
        failed = results.iter().filter(|r| r.error.is_some()).count(),
        "Batch checked"
    );
    Ok(CheckNumbersResponse {
        success: true,
        total: numbers.len(),
        results,
        timestamp: timestamp(),
    })
}

pub async fn send_image(
    State(state): State<AppState>,
    body: Result<Json<SendImageRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let result = send_image_inner(&state, body)
        .await
        .map_err(|e| e.with_shape(ErrorShape::Plain));
    finish("send_image", started, result)
}

async fn send_image_inner(
    state: &AppState,
    body: Result<Json<SendImageRequest>, JsonRejection>,
) -> Result<SendImageResponse, ApiError> {
    ensure_ready(state)?;
    let Json(request) = body.map_err(reject)?;

    let raw = required(request.number, "Phone number is required")?;
    let image_url = required(request.image_url, "imageUrl is required")?;
    let number = PhoneNumber::parse(&raw, state.checker.min_digits())
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let caption = request.message.unwrap_or_default();

    if !state.checker.lookup(&number).await? {
        return Err(ApiError::NotFound(
            "Number is not registered on WhatsApp".to_string(),
        ));
    }

    let media = state
        .media
        .from_url(&image_url, MediaOptions { unsafe_mime: true })
        .await?;

    let sent = state
        .session
        .client()
        .send_message(
            &number.user_id(),
            media,
            SendOptions {
                caption: caption.clone(),
            },
        )
        .await;
    metrics::record_message_sent(sent.is_ok());
    sent?;

    tracing::info!(number = %number, image_url = %image_url, "Image sent");
    Ok(SendImageResponse {
        success: true,
        number: number.digits().to_string(),
        image_url,
        message: caption,
        timestamp: timestamp(),
    })
}

fn ensure_ready(state: &AppState) -> Result<(), ApiError> {
    if state.session.is_ready() {
        Ok(())
    } else {
        Err(ApiError::NotReady)
    }
}

/// A field that must be present and non-empty.
fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

fn reject(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}

fn finish<T>(endpoint: &'static str, started: Instant, result: Result<T, ShapedError>) -> Response
where
    Json<T>: IntoResponse,
{
    let response = match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_request(endpoint, response.status().as_u16(), started);
    response
}
