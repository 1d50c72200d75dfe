//! Test SSH enrichment lookups under `/ssh/`.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_enrich_ssh_known_identity() {
    let app = TestApp::new();

    let response = app.post_signed("/ssh/alice", &ssh_enrich_body()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({"data": {"role": "eng", "groups": ["admin"]}, "allow": true})
    );
}

#[tokio::test]
async fn test_enrich_ssh_unknown_identity() {
    let app = TestApp::new();

    let response = app.post_signed("/ssh/mallory", &ssh_enrich_body()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"data": null, "allow": false}));
}

#[tokio::test]
async fn test_enrich_ssh_invalid_public_key() {
    let app = TestApp::new();
    let body = json!({
        "timestamp": "2024-01-01T00:00:00Z",
        "sshCertificateRequest": {"publicKey": "AAECAw==", "type": "user"}
    });

    let response = app.post_signed("/ssh/alice", &body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Invalid SSH public key");
}

#[tokio::test]
async fn test_enrich_ssh_missing_request() {
    let app = TestApp::new();

    let response = app
        .post_signed("/ssh/alice", &json!({"timestamp": "2024-01-01T00:00:00Z"}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bare_ssh_prefix_redirects() {
    let app = TestApp::new();

    let response = app.post_signed("/ssh", &ssh_enrich_body()).await;

    assert_eq!(response.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.location.as_deref(), Some("/ssh/"));
}
