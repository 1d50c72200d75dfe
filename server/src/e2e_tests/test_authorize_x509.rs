//! Test X.509 authorization under `/auth/`.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_authorize_known_common_name() {
    let app = TestApp::new();

    let response = app.post_signed("/auth/", &x509_authorize_body("alice")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": null, "allow": true}));
}

#[tokio::test]
async fn test_authorize_unknown_common_name() {
    let app = TestApp::new();

    let response = app
        .post_signed("/auth/", &x509_authorize_body("mallory"))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": null, "allow": false}));
}

#[tokio::test]
async fn test_authorize_ignores_rest_of_path() {
    let app = TestApp::new();

    let response = app
        .post_signed("/auth/mallory", &x509_authorize_body("alice"))
        .await;

    assert_eq!(response.json()["allow"], json!(true));
}

#[tokio::test]
async fn test_authorize_without_certificate_denies() {
    let app = TestApp::new();

    let response = app
        .post_signed("/auth/", &json!({"timestamp": "2024-01-01T00:00:00Z"}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": null, "allow": false}));
}

#[tokio::test]
async fn test_bare_auth_prefixes_redirect() {
    let app = TestApp::new();

    let auth = app.post_signed("/auth", &x509_authorize_body("alice")).await;
    let auth_ssh = app.post_signed("/auth-ssh?v=1", &ssh_authorize_body("", "")).await;

    assert_eq!(auth.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(auth.location.as_deref(), Some("/auth/"));
    assert_eq!(auth_ssh.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(auth_ssh.location.as_deref(), Some("/auth-ssh/?v=1"));
}
