//! Test the optional request freshness window.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use crate::auth::Authenticator;
use crate::e2e_tests::helpers::*;

fn app_with_window(secs: u64) -> TestApp {
    let authenticator = Authenticator::new(Arc::new(registry()))
        .with_max_request_age(Some(Duration::from_secs(secs)));
    TestApp::with_authenticator(authenticator, Arc::new(directory()))
}

fn body_at(timestamp: &str) -> serde_json::Value {
    let mut body = x509_authorize_body("alice");
    body["timestamp"] = json!(timestamp);
    body
}

#[tokio::test]
async fn test_window_disabled_by_default() {
    let app = TestApp::new();

    let response = app.post_signed("/auth/", &body_at("2001-01-01T00:00:00Z")).await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_fresh_request_accepted() {
    let app = app_with_window(300);
    let now = Utc::now().to_rfc3339();

    let response = app.post_signed("/auth/", &body_at(&now)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["allow"], json!(true));
}

#[tokio::test]
async fn test_stale_request_rejected() {
    let app = app_with_window(300);

    let response = app.post_signed("/auth/", &body_at("2001-01-01T00:00:00Z")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Stale request");
}

#[tokio::test]
async fn test_future_request_rejected() {
    let app = app_with_window(300);
    let future = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();

    let response = app.post_signed("/auth/", &body_at(&future)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unparseable_timestamp_rejected() {
    let app = app_with_window(300);

    let response = app.post_signed("/auth/", &body_at("yesterday")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
