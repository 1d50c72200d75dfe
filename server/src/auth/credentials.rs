//! Optional bearer / basic credential check layered on top of the signature.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use subtle::ConstantTimeEq;

use super::{CredentialMode, WebhookSecret};

/// Error returned when the configured credentials are not presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// The `Authorization` header does not carry the configured bearer token.
    BearerMismatch,
    /// The basic credentials do not match the configured username and password.
    BasicMismatch,
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BearerMismatch => write!(f, "incorrect bearer authorization header"),
            Self::BasicMismatch => write!(f, "incorrect basic authorization header"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Check the `Authorization` header against the secret's credential mode.
///
/// Secrets without bearer or basic credentials always pass.
///
/// # Errors
/// Returns a `CredentialError` naming the mode that failed.
pub fn check_credentials(secret: &WebhookSecret, headers: &HeaderMap) -> Result<(), CredentialError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match secret.credential_mode() {
        CredentialMode::None => Ok(()),
        CredentialMode::Bearer(token) => {
            let expected = format!("Bearer {token}");
            if constant_time_eq(authorization.as_bytes(), expected.as_bytes()) {
                Ok(())
            } else {
                Err(CredentialError::BearerMismatch)
            }
        }
        CredentialMode::Basic { username, password } => {
            let (user, pass) = parse_basic(authorization).unwrap_or_default();
            // Both fields are always compared.
            let user_ok = constant_time_eq(user.as_bytes(), username.as_bytes());
            let pass_ok = constant_time_eq(pass.as_bytes(), password.as_bytes());
            if user_ok & pass_ok {
                Ok(())
            } else {
                Err(CredentialError::BasicMismatch)
            }
        }
    }
}

/// Parse `Basic <base64(user:pass)>`. The scheme name is case-insensitive.
fn parse_basic(authorization: &str) -> Option<(String, String)> {
    let (scheme, encoded) = authorization.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const SIGNING: &str = "c2lnbmluZw==";

    fn headers_with(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(authorization).expect("valid header"),
        );
        headers
    }

    #[test]
    fn test_no_credentials_configured() {
        let secret = WebhookSecret::new(SIGNING);
        assert!(check_credentials(&secret, &HeaderMap::new()).is_ok());
        assert!(check_credentials(&secret, &headers_with("Bearer anything")).is_ok());
    }

    #[test]
    fn test_bearer_match() {
        let secret = WebhookSecret::new(SIGNING).with_bearer("token-123");
        assert!(check_credentials(&secret, &headers_with("Bearer token-123")).is_ok());
    }

    #[test]
    fn test_bearer_mismatch() {
        let secret = WebhookSecret::new(SIGNING).with_bearer("token-123");
        assert_eq!(
            check_credentials(&secret, &headers_with("Bearer token-124")),
            Err(CredentialError::BearerMismatch)
        );
        assert_eq!(
            check_credentials(&secret, &headers_with("bearer token-123")),
            Err(CredentialError::BearerMismatch)
        );
        assert_eq!(
            check_credentials(&secret, &headers_with("Bearer token-1234")),
            Err(CredentialError::BearerMismatch)
        );
    }

    #[test]
    fn test_bearer_missing_header() {
        let secret = WebhookSecret::new(SIGNING).with_bearer("token-123");
        assert_eq!(
            check_credentials(&secret, &HeaderMap::new()),
            Err(CredentialError::BearerMismatch)
        );
    }

    #[test]
    fn test_basic_match() {
        let secret = WebhookSecret::new(SIGNING).with_basic("alice", "s3cret");
        // base64("alice:s3cret")
        assert!(check_credentials(&secret, &headers_with("Basic YWxpY2U6czNjcmV0")).is_ok());
        assert!(check_credentials(&secret, &headers_with("basic YWxpY2U6czNjcmV0")).is_ok());
    }

    #[test]
    fn test_basic_wrong_password() {
        let secret = WebhookSecret::new(SIGNING).with_basic("alice", "other");
        assert_eq!(
            check_credentials(&secret, &headers_with("Basic YWxpY2U6czNjcmV0")),
            Err(CredentialError::BasicMismatch)
        );
    }

    #[test]
    fn test_basic_missing_header() {
        let secret = WebhookSecret::new(SIGNING).with_basic("alice", "s3cret");
        assert_eq!(
            check_credentials(&secret, &HeaderMap::new()),
            Err(CredentialError::BasicMismatch)
        );
    }

    #[test]
    fn test_basic_rejects_bearer_header() {
        let secret = WebhookSecret::new(SIGNING).with_basic("alice", "s3cret");
        assert_eq!(
            check_credentials(&secret, &headers_with("Bearer YWxpY2U6czNjcmV0")),
            Err(CredentialError::BasicMismatch)
        );
    }

    #[test]
    fn test_parse_basic() {
        assert_eq!(
            parse_basic("Basic YWxpY2U6czNjcmV0"),
            Some(("alice".to_string(), "s3cret".to_string()))
        );
        assert_eq!(parse_basic("Basic !!!"), None);
        assert_eq!(parse_basic("Basic"), None);
        assert_eq!(parse_basic(""), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
