//! End-to-end tests for the HTTP API against a mock collaborator.

use std::sync::atomic::Ordering;

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

async fn post(server: &common::TestServer, path: &str, body: Value) -> (StatusCode, Value) {
    let res = reqwest::Client::new()
        .post(server.url(path))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn test_health_and_status_report_readiness() {
    let server = common::start_server(false).await;

    let health: Value = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["whatsappReady"], false);
    assert!(health["timestamp"].as_str().unwrap().ends_with('Z'));

    server.client.emit(wa_checker::session::ClientEvent::Ready);
    common::wait_for(|| server.session.is_ready()).await;

    let status: Value = reqwest::get(server.url("/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["success"], true);
    assert_eq!(status["isReady"], true);
}

#[tokio::test]
async fn test_business_endpoints_refuse_until_ready() {
    let server = common::start_server(false).await;

    let (status, body) = post(&server, "/check-number", json!({"number": "12345678901"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["isRegistered"], false);
    assert_eq!(
        body["error"],
        "WhatsApp client is not ready. Please scan QR code first."
    );

    let (status, body) = post(&server, "/check-numbers", json!({"numbers": ["12345678901"]})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["results"], json!([]));

    let (status, _) = post(
        &server,
        "/send-image",
        json!({"number": "12345678901", "imageUrl": "https://example.com/a.png"}),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    assert_eq!(server.client.business_calls(), 0);
    assert_eq!(server.media.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_readiness_drops_on_disconnect() {
    let server = common::start_server(true).await;

    server
        .client
        .emit(wa_checker::session::ClientEvent::Disconnected("NAVIGATION".into()));
    common::wait_for(|| !server.session.is_ready()).await;

    let (status, _) = post(&server, "/check-number", json!({"number": "12345678901"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(server.client.business_calls(), 0);
}

#[tokio::test]
async fn test_check_number_cleans_input() {
    let server = common::start_server(true).await;
    server.client.register("12345678901");

    let (status, body) = post(&server, "/check-number", json!({"number": "+1 (234) 567-8901"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["number"], "12345678901");
    assert_eq!(body["isRegistered"], true);
}

#[tokio::test]
async fn test_check_number_rejects_bad_input() {
    let server = common::start_server(true).await;

    let (status, body) = post(&server, "/check-number", json!({"number": "123"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid phone number format");
    assert_eq!(body["isRegistered"], false);

    let (status, body) = post(&server, "/check-number", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Phone number is required");

    let res = reqwest::Client::new()
        .post(server.url("/check-number"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(server.client.business_calls(), 0);
}

#[tokio::test]
async fn test_check_number_collaborator_error_is_internal() {
    let server = common::start_server(true).await;
    server.client.fail("12345678901", "Evaluation failed: session closed");

    let (status, body) = post(&server, "/check-number", json!({"number": "12345678901"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Evaluation failed: session closed");
    assert_eq!(body["isRegistered"], false);
}

#[tokio::test]
async fn test_check_numbers_rejects_empty_and_oversized() {
    let server = common::start_server(true).await;

    let (status, body) = post(&server, "/check-numbers", json!({"numbers": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "An array of phone numbers is required");
    assert_eq!(body["results"], json!([]));

    let (status, _) = post(&server, "/check-numbers", json!({"numbers": "12345678901"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let numbers: Vec<String> = (0..51).map(|i| format!("1234567{i:04}")).collect();
    let (status, body) = post(&server, "/check-numbers", json!({ "numbers": numbers })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Maximum 50 numbers allowed per request");

    assert_eq!(server.client.business_calls(), 0);
}

#[tokio::test]
async fn test_check_numbers_isolates_failures_in_order() {
    let server = common::start_server(true).await;
    server.client.register("12345678901");

    let (status, body) = post(
        &server,
        "/check-numbers",
        json!({"numbers": ["12345678901", "bad", 42]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0], json!({"number": "12345678901", "isRegistered": true}));

    assert_eq!(results[1]["number"], "bad");
    assert_eq!(results[1]["isRegistered"], false);
    assert_eq!(results[1]["error"], "Invalid phone number format");

    assert_eq!(results[2]["number"], "42");
    assert_eq!(results[2]["error"], "Phone number must be a string");

    assert_eq!(server.client.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_send_image_to_unregistered_number_has_no_side_effects() {
    let server = common::start_server(true).await;

    let (status, body) = post(
        &server,
        "/send-image",
        json!({"number": "12345678901", "imageUrl": "https://example.com/a.png"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Number is not registered on WhatsApp");
    assert_eq!(server.media.calls.load(Ordering::SeqCst), 0);
    assert_eq!(server.client.sends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_send_image_requires_image_url() {
    let server = common::start_server(true).await;

    let (status, body) = post(&server, "/send-image", json!({"number": "12345678901"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "imageUrl is required");
    assert_eq!(server.client.business_calls(), 0);
}

#[tokio::test]
async fn test_send_image_delivers_with_caption() {
    let server = common::start_server(true).await;
    server.client.register("12345678901");

    let (status, body) = post(
        &server,
        "/send-image",
        json!({
            "number": "+1 234 567 8901",
            "imageUrl": "https://example.com/a.png",
            "message": "hello"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["number"], "12345678901");
    assert_eq!(body["imageUrl"], "https://example.com/a.png");
    assert_eq!(body["message"], "hello");

    assert_eq!(server.media.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        server.client.sent(),
        vec![("12345678901@c.us".to_string(), "hello".to_string())]
    );
}

#[tokio::test]
async fn test_cors_and_request_id_headers() {
    let server = common::start_server(false).await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/health"))
        .header("origin", "https://dashboard.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers()["access-control-allow-origin"].to_str().unwrap(),
        "*"
    );
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let res = client
        .get(server.url("/health"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"].to_str().unwrap(), "trace-me");

    let res = client
        .request(reqwest::Method::OPTIONS, server.url("/check-number"))
        .header("origin", "https://dashboard.example")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
}
