//! Test that callback failures surface as opaque 500s.

use std::sync::Arc;

use axum::http::StatusCode;

use crate::e2e_tests::helpers::*;
use crate::testing;

#[tokio::test]
async fn test_failing_callbacks_on_every_route() {
    let callbacks = Arc::new(FailingCallbacks::default());
    let app = TestApp::with_callbacks(callbacks.clone());

    let cases = [
        ("/alice", x509_enrich_body()),
        ("/ssh/alice", ssh_enrich_body()),
        ("/auth/", x509_authorize_body("alice")),
        (
            "/auth-ssh/",
            ssh_authorize_body(testing::SSH_USER_KEY_WIRE, testing::SSH_CA_KEY_WIRE),
        ),
    ];

    for (path, body) in &cases {
        let response = app.post_signed(path, body).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR, "{path}");
        assert_eq!(response.text(), "Internal Server Error", "{path}");
        assert!(!response.text().contains("unavailable"));
    }

    assert_eq!(callbacks.call_count(), cases.len());
}
