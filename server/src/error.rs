//! Terminal failures of a webhook call and their HTTP mapping.
//!
//! # Invariants
//! - Every variant maps to exactly one status code.
//! - 5xx responses never carry internal detail; the full error is logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::{CredentialError, FreshnessError, SignatureError};
use crate::callbacks::CallbackError;
use crate::keys::KeyParseError;

/// A failure that ends the request.
#[derive(Debug)]
pub enum WebhookError {
    /// Only `POST` is routed.
    MethodNotAllowed,
    /// `X-Smallstep-Webhook-ID` is missing.
    MissingWebhookId,
    /// No secret is configured for the webhook ID.
    UnknownWebhookId,
    /// Bearer or basic credentials did not match.
    Unauthorized(CredentialError),
    /// `X-Smallstep-Signature` is not valid hex.
    InvalidSignatureEncoding(SignatureError),
    /// The body could not be read (including exceeding the size limit).
    BodyRead(axum::Error),
    /// The configured signing secret is not valid base64.
    InvalidSigningSecret(base64::DecodeError),
    /// The body signature did not verify.
    SignatureMismatch(SignatureError),
    /// The verified body is not a valid envelope.
    MalformedBody(serde_json::Error),
    /// The envelope timestamp is outside the configured freshness window.
    StaleRequest(FreshnessError),
    /// The X.509 CSR in a verified body could not be parsed.
    InvalidCsr(KeyParseError),
    /// The caller supplied a malformed SSH public key for enrichment.
    InvalidSshRequestKey(KeyParseError),
    /// A key in a verified SSH certificate could not be parsed.
    InvalidSshCertificateKey(KeyParseError),
    /// A lookup or authorization callback failed.
    Callback(CallbackError),
}

impl WebhookError {
    /// HTTP status for this failure.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingWebhookId
            | Self::InvalidSignatureEncoding(_)
            | Self::BodyRead(_)
            | Self::SignatureMismatch(_)
            | Self::StaleRequest(_)
            | Self::InvalidSshRequestKey(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::UnknownWebhookId
            | Self::InvalidSigningSecret(_)
            | Self::MalformedBody(_)
            | Self::InvalidCsr(_)
            | Self::InvalidSshCertificateKey(_)
            | Self::Callback(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the caller.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::MissingWebhookId => "Missing X-Smallstep-Webhook-ID header",
            Self::Unauthorized(_) => "Unauthorized",
            Self::InvalidSignatureEncoding(_) => "Invalid X-Smallstep-Signature header",
            Self::BodyRead(_) => "Failed to read body",
            Self::SignatureMismatch(_) => "Invalid signature",
            Self::StaleRequest(_) => "Stale request",
            Self::InvalidSshRequestKey(_) => "Invalid SSH public key",
            Self::UnknownWebhookId
            | Self::InvalidSigningSecret(_)
            | Self::MalformedBody(_)
            | Self::InvalidCsr(_)
            | Self::InvalidSshCertificateKey(_)
            | Self::Callback(_) => "Internal Server Error",
        }
    }

    /// Log the failure with its full cause.
    ///
    /// Server-side failures are logged at `error`, caller failures at `warn`.
    /// Request context (route, webhook ID, identity) comes from the enclosing span.
    pub fn log(&self) {
        if self.status().is_server_error() {
            tracing::error!(status = self.status().as_u16(), "{self}");
        } else {
            tracing::warn!(status = self.status().as_u16(), "{self}");
        }
    }
}

impl std::fmt::Display for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MethodNotAllowed => write!(f, "method not allowed"),
            Self::MissingWebhookId => write!(f, "missing X-Smallstep-Webhook-ID header"),
            Self::UnknownWebhookId => write!(f, "missing signing secret for webhook"),
            Self::Unauthorized(e) => write!(f, "{e}"),
            Self::InvalidSignatureEncoding(e) => write!(f, "invalid signature header: {e}"),
            Self::BodyRead(e) => write!(f, "failed to read body: {e}"),
            Self::InvalidSigningSecret(e) => write!(f, "failed to decode signing secret: {e}"),
            Self::SignatureMismatch(e) => write!(f, "failed to verify request signature: {e}"),
            Self::MalformedBody(e) => write!(f, "failed to decode request body: {e}"),
            Self::StaleRequest(e) => write!(f, "rejected request timestamp: {e}"),
            Self::InvalidCsr(e) | Self::InvalidSshCertificateKey(e) => write!(f, "{e}"),
            Self::InvalidSshRequestKey(e) => write!(f, "caller supplied {e}"),
            Self::Callback(e) => write!(f, "callback failed: {e}"),
        }
    }
}

impl std::error::Error for WebhookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MethodNotAllowed | Self::MissingWebhookId | Self::UnknownWebhookId => None,
            Self::Unauthorized(e) => Some(e),
            Self::InvalidSignatureEncoding(e) | Self::SignatureMismatch(e) => Some(e),
            Self::BodyRead(e) => Some(e),
            Self::InvalidSigningSecret(e) => Some(e),
            Self::MalformedBody(e) => Some(e),
            Self::StaleRequest(e) => Some(e),
            Self::InvalidCsr(e) | Self::InvalidSshRequestKey(e) | Self::InvalidSshCertificateKey(e) => {
                Some(e)
            }
            Self::Callback(e) => Some(e.as_ref()),
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_bad_request() {
        assert_eq!(WebhookError::MissingWebhookId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            WebhookError::SignatureMismatch(SignatureError::Mismatch).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::InvalidSignatureEncoding(SignatureError::InvalidKey).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_credential_errors_are_unauthorized() {
        assert_eq!(
            WebhookError::Unauthorized(CredentialError::BearerMismatch).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::Unauthorized(CredentialError::BasicMismatch).public_message(),
            "Unauthorized"
        );
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let errors = [
            WebhookError::UnknownWebhookId,
            WebhookError::Callback("database is down".into()),
            WebhookError::MalformedBody(
                serde_json::from_str::<serde_json::Value>("{").expect_err("malformed json"),
            ),
        ];
        for error in errors {
            assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(error.public_message(), "Internal Server Error");
        }
    }

    #[test]
    fn test_display_includes_cause() {
        let error = WebhookError::Callback("database is down".into());
        assert_eq!(error.to_string(), "callback failed: database is down");
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = WebhookError::Callback("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&body[..], b"Internal Server Error");
    }
}
