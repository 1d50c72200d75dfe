//! Test that terminal failures and decisions are logged with request context.

use axum::http::StatusCode;

use crate::e2e_tests::helpers::*;
use crate::testing;

#[tokio::test]
async fn test_unknown_webhook_id_is_logged_with_id() {
    let capture = LogCapture::default();
    let _guard = capture.install();
    let app = TestApp::new();
    let body = x509_authorize_body("alice").to_string();

    let response = app
        .send(
            signed_request("/auth/", "no-such-hook", body.as_bytes())
                .body(body.into())
                .expect("valid request"),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().contains("no-such-hook"));

    let output = capture.output();
    let line = output
        .lines()
        .find(|line| line.contains("missing signing secret for webhook"))
        .unwrap_or_else(|| panic!("failure not logged:\n{output}"));
    assert!(line.contains("ERROR"), "{line}");
    assert!(line.contains("no-such-hook"), "{line}");
    assert!(line.contains("authorize-x509"), "{line}");
    assert!(line.contains("status=500"), "{line}");
}

#[tokio::test]
async fn test_signature_mismatch_is_logged_as_warning() {
    let capture = LogCapture::default();
    let _guard = capture.install();
    let app = TestApp::new();
    let body = x509_authorize_body("alice").to_string();

    let response = app
        .send(
            signed_request("/auth/", testing::WEBHOOK_ID, b"something else")
                .body(body.into())
                .expect("valid request"),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let output = capture.output();
    let line = output
        .lines()
        .find(|line| line.contains("failed to verify request signature"))
        .unwrap_or_else(|| panic!("failure not logged:\n{output}"));
    assert!(line.contains("WARN"), "{line}");
    assert!(line.contains(testing::WEBHOOK_ID), "{line}");
}

#[tokio::test]
async fn test_decision_is_logged_with_identity() {
    let capture = LogCapture::default();
    let _guard = capture.install();
    let app = TestApp::new();

    let response = app.post_signed("/ssh/alice", &ssh_enrich_body()).await;

    assert_eq!(response.status, StatusCode::OK);
    let output = capture.output();
    let line = output
        .lines()
        .find(|line| line.contains("webhook handled"))
        .unwrap_or_else(|| panic!("decision not logged:\n{output}"));
    assert!(line.contains("enrich-ssh"), "{line}");
    assert!(line.contains("alice"), "{line}");
    assert!(line.contains("allow=true"), "{line}");
    assert!(!output.contains(testing::SIGNING_SECRET));
}
