//! Request authentication.
//!
//! Turns an inbound call into an authenticated, decoded [`RequestEnvelope`], or
//! into the terminal [`WebhookError`] for the first check that fails.
//!
//! # Pre-conditions
//! - The transport has already terminated (m)TLS.
//!
//! # Post-conditions
//! - On success the body signature has been verified against the secret for the
//!   presented webhook ID, and the envelope was decoded from those exact bytes.
//!
//! # Invariants
//! - Checks run in a fixed order and stop at the first failure:
//!   webhook ID, secret lookup, credentials, signature header, body read,
//!   signing key decode, signature verification, JSON decode, freshness.
//! - Nothing in the body is inspected before the signature verifies.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::HeaderMap;

use super::{SecretRegistry, check_credentials, check_freshness, decode_signature, verify};
use crate::error::WebhookError;
use crate::types::RequestEnvelope;

/// Header selecting the webhook secret.
pub const WEBHOOK_ID_HEADER: &str = "x-smallstep-webhook-id";
/// Header carrying the hex HMAC-SHA256 of the body.
pub const SIGNATURE_HEADER: &str = "x-smallstep-signature";
/// Default upper bound on request body size.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// A request that passed authentication.
#[derive(Debug)]
pub struct AuthenticatedRequest {
    /// Webhook ID whose secret verified the call.
    pub webhook_id: String,
    /// Decoded body.
    pub envelope: RequestEnvelope,
}

/// Authenticates webhook calls against a [`SecretRegistry`].
#[derive(Debug, Clone)]
pub struct Authenticator {
    registry: Arc<SecretRegistry>,
    max_body_bytes: usize,
    max_request_age: Option<Duration>,
}

impl Authenticator {
    /// Create an authenticator with the default body limit and no freshness window.
    #[must_use]
    pub const fn new(registry: Arc<SecretRegistry>) -> Self {
        Self {
            registry,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_request_age: None,
        }
    }

    /// Set the maximum body size read into memory.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Require the envelope timestamp to be within `max_age` of now.
    #[must_use]
    pub const fn with_max_request_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_request_age = max_age;
        self
    }

    /// Authenticate and decode a webhook call.
    ///
    /// Records `webhook_id` on the current span once known.
    ///
    /// # Errors
    /// Returns the `WebhookError` for the first check that fails.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<AuthenticatedRequest, WebhookError> {
        let webhook_id = headers
            .get(WEBHOOK_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|id| !id.is_empty())
            .ok_or(WebhookError::MissingWebhookId)?;
        tracing::Span::current().record("webhook_id", webhook_id);

        let secret = self
            .registry
            .get(webhook_id)
            .ok_or(WebhookError::UnknownWebhookId)?;

        check_credentials(secret, headers).map_err(WebhookError::Unauthorized)?;

        let signature_header = headers
            .get(SIGNATURE_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .unwrap_or_default();
        let signature =
            decode_signature(&signature_header).map_err(WebhookError::InvalidSignatureEncoding)?;

        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(WebhookError::BodyRead)?;

        let key = secret
            .signing_key()
            .map_err(WebhookError::InvalidSigningSecret)?;

        verify(&key, &body, &signature).map_err(WebhookError::SignatureMismatch)?;

        let envelope = RequestEnvelope::from_slice(&body).map_err(WebhookError::MalformedBody)?;

        if let Some(max_age) = self.max_request_age {
            check_freshness(&envelope.timestamp, chrono::Utc::now(), max_age)
                .map_err(WebhookError::StaleRequest)?;
        }

        Ok(AuthenticatedRequest {
            webhook_id: webhook_id.to_string(),
            envelope,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Bytes;
    use axum::http::header::AUTHORIZATION;
    use axum::http::{HeaderValue, StatusCode};

    use std::collections::HashMap;

    use super::*;
    use crate::auth::{WebhookSecret, sign};
    use crate::testing;

    const BODY: &str = r#"{"timestamp":"2024-01-01T00:00:00Z","x509Certificate":{"subject":{"commonName":"alice"}}}"#;

    fn registry() -> Arc<SecretRegistry> {
        let secrets = HashMap::from([
            (
                testing::WEBHOOK_ID.to_string(),
                WebhookSecret::new(testing::SIGNING_SECRET),
            ),
            (
                "bearer-hook".to_string(),
                WebhookSecret::new(testing::SIGNING_SECRET).with_bearer("token-123"),
            ),
            (
                "broken-hook".to_string(),
                WebhookSecret::new("not//base64!"),
            ),
        ]);
        Arc::new(SecretRegistry::new(secrets).expect("valid registry"))
    }

    fn signed_headers(webhook_id: &str, body: &str) -> HeaderMap {
        let signature = sign(&testing::signing_key(), body.as_bytes()).expect("sign");
        let mut headers = HeaderMap::new();
        headers.insert(
            WEBHOOK_ID_HEADER,
            HeaderValue::from_str(webhook_id).expect("valid header"),
        );
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&signature).expect("valid header"),
        );
        headers
    }

    fn failing_body() -> Body {
        Body::from_stream(futures::stream::iter([Err::<Bytes, std::io::Error>(
            std::io::Error::other("connection reset"),
        )]))
    }

    async fn authenticate(
        authenticator: &Authenticator,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<AuthenticatedRequest, WebhookError> {
        authenticator.authenticate(headers, body).await
    }

    #[tokio::test]
    async fn test_valid_request() {
        let authenticator = Authenticator::new(registry());
        let headers = signed_headers(testing::WEBHOOK_ID, BODY);

        let request = authenticate(&authenticator, &headers, Body::from(BODY))
            .await
            .expect("authenticated");
        assert_eq!(request.webhook_id, testing::WEBHOOK_ID);
        assert_eq!(request.envelope.timestamp, "2024-01-01T00:00:00Z");
        assert_eq!(
            request.envelope.into_x509_certificate().subject.common_name,
            "alice"
        );
    }

    #[tokio::test]
    async fn test_missing_webhook_id_does_not_read_body() {
        let authenticator = Authenticator::new(registry());
        let mut headers = signed_headers(testing::WEBHOOK_ID, BODY);
        headers.remove(WEBHOOK_ID_HEADER);

        let result = authenticate(&authenticator, &headers, failing_body()).await;
        assert!(matches!(result, Err(WebhookError::MissingWebhookId)));
    }

    #[tokio::test]
    async fn test_empty_webhook_id() {
        let authenticator = Authenticator::new(registry());
        let headers = signed_headers("", BODY);

        let result = authenticate(&authenticator, &headers, Body::from(BODY)).await;
        assert!(matches!(result, Err(WebhookError::MissingWebhookId)));
    }

    #[tokio::test]
    async fn test_unknown_webhook_id() {
        let authenticator = Authenticator::new(registry());
        let headers = signed_headers("unknown-hook", BODY);

        let error = authenticate(&authenticator, &headers, Body::from(BODY))
            .await
            .expect_err("unknown webhook");
        assert!(matches!(error, WebhookError::UnknownWebhookId));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_bearer_required_even_with_valid_signature() {
        let authenticator = Authenticator::new(registry());
        let headers = signed_headers("bearer-hook", BODY);

        let error = authenticate(&authenticator, &headers, Body::from(BODY))
            .await
            .expect_err("missing bearer");
        assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bearer_accepted() {
        let authenticator = Authenticator::new(registry());
        let mut headers = signed_headers("bearer-hook", BODY);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token-123"));

        assert!(authenticate(&authenticator, &headers, Body::from(BODY)).await.is_ok());
    }

    #[tokio::test]
    async fn test_credentials_checked_before_body() {
        let authenticator = Authenticator::new(registry());
        let headers = signed_headers("bearer-hook", BODY);

        let result = authenticate(&authenticator, &headers, failing_body()).await;
        assert!(matches!(result, Err(WebhookError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_signature_not_hex() {
        let authenticator = Authenticator::new(registry());
        let mut headers = signed_headers(testing::WEBHOOK_ID, BODY);
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_static("zz"));

        let error = authenticate(&authenticator, &headers, Body::from(BODY))
            .await
            .expect_err("bad hex");
        assert!(matches!(error, WebhookError::InvalidSignatureEncoding(_)));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_signature_is_mismatch() {
        let authenticator = Authenticator::new(registry());
        let mut headers = signed_headers(testing::WEBHOOK_ID, BODY);
        headers.remove(SIGNATURE_HEADER);

        let result = authenticate(&authenticator, &headers, Body::from(BODY)).await;
        assert!(matches!(result, Err(WebhookError::SignatureMismatch(_))));
    }

    #[tokio::test]
    async fn test_body_read_failure() {
        let authenticator = Authenticator::new(registry());
        let headers = signed_headers(testing::WEBHOOK_ID, BODY);

        let error = authenticate(&authenticator, &headers, failing_body())
            .await
            .expect_err("body read");
        assert!(matches!(error, WebhookError::BodyRead(_)));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let authenticator = Authenticator::new(registry()).with_max_body_bytes(16);
        let headers = signed_headers(testing::WEBHOOK_ID, BODY);

        let result = authenticate(&authenticator, &headers, Body::from(BODY)).await;
        assert!(matches!(result, Err(WebhookError::BodyRead(_))));
    }

    #[tokio::test]
    async fn test_undecodable_signing_secret() {
        let authenticator = Authenticator::new(registry());
        let headers = signed_headers("broken-hook", BODY);

        let error = authenticate(&authenticator, &headers, Body::from(BODY))
            .await
            .expect_err("bad secret");
        assert!(matches!(error, WebhookError::InvalidSigningSecret(_)));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_tampered_body() {
        let authenticator = Authenticator::new(registry());
        let headers = signed_headers(testing::WEBHOOK_ID, BODY);
        let tampered = BODY.replace("alice", "mallory");

        let error = authenticate(&authenticator, &headers, Body::from(tampered))
            .await
            .expect_err("tampered");
        assert!(matches!(error, WebhookError::SignatureMismatch(_)));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.public_message(), "Invalid signature");
    }

    #[tokio::test]
    async fn test_signed_malformed_json() {
        let authenticator = Authenticator::new(registry());
        let body = "{not json";
        let headers = signed_headers(testing::WEBHOOK_ID, body);

        let error = authenticate(&authenticator, &headers, Body::from(body))
            .await
            .expect_err("malformed");
        assert!(matches!(error, WebhookError::MalformedBody(_)));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_freshness_disabled_by_default() {
        let authenticator = Authenticator::new(registry());
        let body = r#"{"timestamp":"1999-01-01T00:00:00Z"}"#;
        let headers = signed_headers(testing::WEBHOOK_ID, body);

        assert!(authenticate(&authenticator, &headers, Body::from(body)).await.is_ok());
    }

    #[tokio::test]
    async fn test_freshness_window() {
        let authenticator = Authenticator::new(registry())
            .with_max_request_age(Some(Duration::from_secs(300)));

        let stale = r#"{"timestamp":"1999-01-01T00:00:00Z"}"#;
        let headers = signed_headers(testing::WEBHOOK_ID, stale);
        let error = authenticate(&authenticator, &headers, Body::from(stale))
            .await
            .expect_err("stale");
        assert!(matches!(error, WebhookError::StaleRequest(_)));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);

        let fresh = format!(
            r#"{{"timestamp":"{}"}}"#,
            chrono::Utc::now().to_rfc3339()
        );
        let headers = signed_headers(testing::WEBHOOK_ID, &fresh);
        assert!(authenticate(&authenticator, &headers, Body::from(fresh)).await.is_ok());
    }
}
