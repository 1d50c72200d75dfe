//! Test SSH authorization under `/auth-ssh/`.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;
use crate::testing;

#[tokio::test]
async fn test_authorize_ssh_allows() {
    let app = TestApp::new();
    let body = ssh_authorize_body(testing::SSH_USER_KEY_WIRE, testing::SSH_CA_KEY_WIRE);

    let response = app.post_signed("/auth-ssh/", &body).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": null, "allow": true}));
}

#[tokio::test]
async fn test_authorize_ssh_without_keys() {
    let app = TestApp::new();

    let response = app.post_signed("/auth-ssh/", &ssh_authorize_body("", "")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["allow"], json!(true));
}

#[tokio::test]
async fn test_authorize_ssh_invalid_public_key() {
    let callbacks = std::sync::Arc::new(FailingCallbacks::default());
    let app = TestApp::with_callbacks(callbacks.clone());
    let body = ssh_authorize_body("AAECAw==", testing::SSH_CA_KEY_WIRE);

    let response = app.post_signed("/auth-ssh/", &body).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Internal Server Error");
    assert_eq!(callbacks.call_count(), 0);
}

#[tokio::test]
async fn test_authorize_ssh_invalid_signature_key() {
    let callbacks = std::sync::Arc::new(FailingCallbacks::default());
    let app = TestApp::with_callbacks(callbacks.clone());
    let body = ssh_authorize_body(testing::SSH_USER_KEY_WIRE, "AAECAw==");

    let response = app.post_signed("/auth-ssh/", &body).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(callbacks.call_count(), 0);
}

#[tokio::test]
async fn test_auth_ssh_wins_over_auth_prefix() {
    let app = TestApp::new();

    // An X.509 policy would deny this body since it carries no certificate.
    let response = app
        .post_signed("/auth-ssh/anything", &ssh_authorize_body("", ""))
        .await;

    assert_eq!(response.json()["allow"], json!(true));
}
