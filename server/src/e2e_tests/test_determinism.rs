//! Test that identical requests produce identical responses.

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let app = TestApp::new();
    let body = x509_enrich_body();

    let first = app.post_signed("/alice", &body).await;
    let second = app.post_signed("/alice", &body).await;

    assert_eq!(first.status, second.status);
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_separate_apps_agree() {
    let body = x509_authorize_body("alice");

    let first = TestApp::new().post_signed("/auth/", &body).await;
    let second = TestApp::new().post_signed("/auth/", &body).await;

    assert_eq!(first.body, second.body);
}
