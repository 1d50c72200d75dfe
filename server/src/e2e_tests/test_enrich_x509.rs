//! Test X.509 enrichment lookups keyed by the last path segment.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_enrich_known_identity() {
    let app = TestApp::new();

    let response = app.post_signed("/alice", &x509_enrich_body()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        response.json(),
        json!({"data": {"role": "eng", "groups": ["admin"]}, "allow": true})
    );
}

#[tokio::test]
async fn test_enrich_unknown_identity() {
    let app = TestApp::new();

    let response = app.post_signed("/mallory", &x509_enrich_body()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": null, "allow": false}));
}

#[tokio::test]
async fn test_enrich_identity_with_null_data() {
    let app = TestApp::new();

    let response = app.post_signed("/carol", &x509_enrich_body()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": null, "allow": true}));
}

#[tokio::test]
async fn test_enrich_uses_last_segment() {
    let app = TestApp::new();

    let response = app.post_signed("/tenants/acme/alice", &x509_enrich_body()).await;

    assert_eq!(response.json()["allow"], json!(true));
}

#[tokio::test]
async fn test_enrich_percent_encoded_identity() {
    let app = TestApp::new();

    let response = app
        .post_signed("/alice%40example.com", &x509_enrich_body())
        .await;

    assert_eq!(response.json(), json!({"data": {"email": true}, "allow": true}));
}

#[tokio::test]
async fn test_enrich_encoded_slash_splits_identity() {
    let app = TestApp::new();

    let response = app.post_signed("/tenants%2Falice", &x509_enrich_body()).await;

    assert_eq!(
        response.json(),
        json!({"data": {"role": "eng", "groups": ["admin"]}, "allow": true})
    );
}

#[tokio::test]
async fn test_enrich_root_path_has_empty_key() {
    let app = TestApp::new();

    let response = app.post_signed("/", &x509_enrich_body()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": null, "allow": false}));
}

#[tokio::test]
async fn test_enrich_without_csr_fails() {
    let app = TestApp::new();

    let response = app
        .post_signed("/alice", &json!({"timestamp": "2024-01-01T00:00:00Z"}))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Internal Server Error");
}

#[tokio::test]
async fn test_enrich_with_garbage_csr_fails() {
    let app = TestApp::new();
    let body = json!({
        "timestamp": "2024-01-01T00:00:00Z",
        "x509CertificateRequest": {"raw": "AAECAw=="}
    });

    let response = app.post_signed("/alice", &body).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}
