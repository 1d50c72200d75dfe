//! Test the authentication checks and their status codes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use crate::auth::{Authenticator, SIGNATURE_HEADER, WEBHOOK_ID_HEADER};
use crate::e2e_tests::helpers::*;
use crate::testing;

fn body_bytes() -> Vec<u8> {
    x509_authorize_body("alice").to_string().into_bytes()
}

fn build(builder: axum::http::request::Builder, body: Vec<u8>) -> Request<Body> {
    builder.body(Body::from(body)).expect("valid request")
}

#[tokio::test]
async fn test_valid_signature_accepted() {
    let app = TestApp::new();
    let body = body_bytes();

    let response = app
        .send(build(signed_request("/auth/", testing::WEBHOOK_ID, &body), body))
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_webhook_id() {
    let app = TestApp::new();
    let body = body_bytes();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/")
        .header(SIGNATURE_HEADER, signature(&body));

    let response = app.send(build(request, body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Missing X-Smallstep-Webhook-ID header");
}

#[tokio::test]
async fn test_empty_webhook_id() {
    let app = TestApp::new();
    let body = body_bytes();

    let response = app.send(build(signed_request("/auth/", "", &body), body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_webhook_id() {
    let app = TestApp::new();
    let body = body_bytes();

    let response = app
        .send(build(signed_request("/auth/", "no-such-hook", &body), body))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Internal Server Error");
}

#[tokio::test]
async fn test_signed_non_object_body() {
    let app = TestApp::new();

    let bodies: [&[u8]; 3] = [b"[]", br#"["2024-01-01T00:00:00Z"]"#, b"null"];

    for path in ["/auth/", "/auth-ssh/", "/alice"] {
        for body in bodies {
            let response = app
                .send(build(
                    signed_request(path, testing::WEBHOOK_ID, body),
                    body.to_vec(),
                ))
                .await;

            assert_eq!(
                response.status,
                StatusCode::INTERNAL_SERVER_ERROR,
                "{path} {}",
                String::from_utf8_lossy(body)
            );
        }
    }
}

#[tokio::test]
async fn test_signed_array_payload() {
    let app = TestApp::new();
    let body = json!({"timestamp": "2024-01-01T00:00:00Z", "sshCertificate": []})
        .to_string()
        .into_bytes();

    let response = app
        .send(build(signed_request("/auth-ssh/", testing::WEBHOOK_ID, &body), body))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_invalid_signing_secret() {
    let app = TestApp::new();
    let body = body_bytes();

    let response = app
        .send(build(signed_request("/auth/", BROKEN_WEBHOOK_ID, &body), body))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_signature_mismatch() {
    let app = TestApp::new();
    let body = body_bytes();
    let request = signed_request("/auth/", testing::WEBHOOK_ID, &body);
    let tampered = x509_authorize_body("mallory").to_string().into_bytes();

    let response = app.send(build(request, tampered)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Invalid signature");
}

#[tokio::test]
async fn test_missing_signature_header() {
    let app = TestApp::new();
    let body = body_bytes();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/")
        .header(WEBHOOK_ID_HEADER, testing::WEBHOOK_ID);

    let response = app.send(build(request, body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Invalid signature");
}

#[tokio::test]
async fn test_non_hex_signature_header() {
    let app = TestApp::new();
    let body = body_bytes();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/")
        .header(WEBHOOK_ID_HEADER, testing::WEBHOOK_ID)
        .header(SIGNATURE_HEADER, "not-hex");

    let response = app.send(build(request, body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Invalid X-Smallstep-Signature header");
}

#[tokio::test]
async fn test_uppercase_hex_signature_accepted() {
    let app = TestApp::new();
    let body = body_bytes();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/")
        .header(WEBHOOK_ID_HEADER, testing::WEBHOOK_ID)
        .header(SIGNATURE_HEADER, signature(&body).to_uppercase());

    let response = app.send(build(request, body)).await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_with_valid_signature() {
    let app = TestApp::new();
    let body = b"{not json".to_vec();

    let response = app
        .send(build(signed_request("/auth/", testing::WEBHOOK_ID, &body), body))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_body_over_limit() {
    let authenticator = Authenticator::new(Arc::new(registry())).with_max_body_bytes(16);
    let app = TestApp::with_authenticator(authenticator, Arc::new(directory()));
    let body = body_bytes();

    let response = app
        .send(build(signed_request("/auth/", testing::WEBHOOK_ID, &body), body))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Failed to read body");
}

#[tokio::test]
async fn test_non_post_rejected() {
    let app = TestApp::new();

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let request = Request::builder()
            .method(method.clone())
            .uri("/alice")
            .header(WEBHOOK_ID_HEADER, testing::WEBHOOK_ID)
            .body(Body::empty())
            .expect("valid request");

        let response = app.send(request).await;
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
    }
}

#[tokio::test]
async fn test_bearer_token_required() {
    let app = TestApp::new();
    let body = body_bytes();

    let missing = app
        .send(build(signed_request("/auth/", BEARER_WEBHOOK_ID, &body), body.clone()))
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.text(), "Unauthorized");

    let wrong = app
        .send(build(
            signed_request("/auth/", BEARER_WEBHOOK_ID, &body)
                .header(header::AUTHORIZATION, "Bearer wrong"),
            body.clone(),
        ))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let ok = app
        .send(build(
            signed_request("/auth/", BEARER_WEBHOOK_ID, &body)
                .header(header::AUTHORIZATION, format!("Bearer {BEARER_TOKEN}")),
            body,
        ))
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.json(), json!({"data": null, "allow": true}));
}

#[tokio::test]
async fn test_bearer_checked_before_signature() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/")
        .header(WEBHOOK_ID_HEADER, BEARER_WEBHOOK_ID)
        .header(SIGNATURE_HEADER, "not-hex");

    let response = app.send(build(request, body_bytes())).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_basic_credentials_required() {
    let app = TestApp::new();
    let body = body_bytes();
    let basic = |user: &str, pass: &str| {
        format!("Basic {}", BASE64.encode(format!("{user}:{pass}")))
    };

    let missing = app
        .send(build(signed_request("/auth/", BASIC_WEBHOOK_ID, &body), body.clone()))
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let wrong = app
        .send(build(
            signed_request("/auth/", BASIC_WEBHOOK_ID, &body)
                .header(header::AUTHORIZATION, basic(BASIC_USERNAME, "wrong")),
            body.clone(),
        ))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let ok = app
        .send(build(
            signed_request("/auth/", BASIC_WEBHOOK_ID, &body)
                .header(header::AUTHORIZATION, basic(BASIC_USERNAME, BASIC_PASSWORD)),
            body,
        ))
        .await;
    assert_eq!(ok.status, StatusCode::OK);
}

#[tokio::test]
async fn test_credentials_ignored_without_configuration() {
    let app = TestApp::new();
    let body = body_bytes();

    let response = app
        .send(build(
            signed_request("/auth/", testing::WEBHOOK_ID, &body)
                .header(header::AUTHORIZATION, "Bearer whatever"),
            body,
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
}
