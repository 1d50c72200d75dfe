//! Per-webhook shared secrets.
//!
//! # Pre-conditions
//! - `signing` holds the base64-encoded HMAC key exactly as the certificate
//!   authority issued it.
//!
//! # Post-conditions
//! - `WebhookSecret` instances are immutable once loaded.
//!
//! # Invariants
//! - At most one credential mode is active per secret: bearer wins over basic.
//! - Empty credential strings are treated as "not configured".

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

/// The second authentication factor required by a secret, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode<'a> {
    /// The signature is the only factor.
    None,
    /// `Authorization: Bearer <token>` must match exactly.
    Bearer(&'a str),
    /// HTTP Basic credentials must match both fields exactly.
    Basic {
        username: &'a str,
        password: &'a str,
    },
}

/// Shared secret material for a single webhook ID.
#[derive(Clone, Default, Deserialize)]
pub struct WebhookSecret {
    /// Base64-encoded signing key for HMAC-SHA256.
    pub signing: String,
    /// Optional bearer token.
    #[serde(default)]
    pub bearer: Option<String>,
    /// Optional basic-auth username.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional basic-auth password.
    #[serde(default)]
    pub password: Option<String>,
}

impl WebhookSecret {
    /// Create a secret authenticated by signature only.
    #[must_use]
    pub fn new(signing: impl Into<String>) -> Self {
        Self {
            signing: signing.into(),
            ..Self::default()
        }
    }

    /// Require a bearer token in addition to the signature.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Require HTTP Basic credentials in addition to the signature.
    #[must_use]
    pub fn with_basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// The credential check this secret requires before signature verification.
    #[must_use]
    pub fn credential_mode(&self) -> CredentialMode<'_> {
        if let Some(token) = non_empty(self.bearer.as_deref()) {
            return CredentialMode::Bearer(token);
        }
        let username = non_empty(self.username.as_deref());
        let password = non_empty(self.password.as_deref());
        if username.is_some() || password.is_some() {
            return CredentialMode::Basic {
                username: username.unwrap_or_default(),
                password: password.unwrap_or_default(),
            };
        }
        CredentialMode::None
    }

    /// Whether both bearer and basic credentials are configured.
    ///
    /// Only the bearer token is enforced in that case.
    #[must_use]
    pub fn has_conflicting_credentials(&self) -> bool {
        non_empty(self.bearer.as_deref()).is_some()
            && (non_empty(self.username.as_deref()).is_some()
                || non_empty(self.password.as_deref()).is_some())
    }

    /// Decode the signing key from base64.
    ///
    /// # Errors
    /// Returns the decode error if the configured key is not valid base64.
    pub fn signing_key(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(self.signing.as_bytes())
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSecret")
            .field("signing", &"<redacted>")
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNING: &str = "c2lnbmluZy1rZXk=";

    #[test]
    fn test_signature_only_secret() {
        let secret = WebhookSecret::new(SIGNING);
        assert_eq!(secret.credential_mode(), CredentialMode::None);
        assert_eq!(secret.signing_key().expect("valid base64"), b"signing-key");
    }

    #[test]
    fn test_bearer_secret() {
        let secret = WebhookSecret::new(SIGNING).with_bearer("token-123");
        assert_eq!(secret.credential_mode(), CredentialMode::Bearer("token-123"));
    }

    #[test]
    fn test_basic_secret() {
        let secret = WebhookSecret::new(SIGNING).with_basic("alice", "s3cret");
        assert_eq!(
            secret.credential_mode(),
            CredentialMode::Basic {
                username: "alice",
                password: "s3cret"
            }
        );
    }

    #[test]
    fn test_basic_with_only_password() {
        let secret = WebhookSecret {
            password: Some("s3cret".to_string()),
            ..WebhookSecret::new(SIGNING)
        };
        assert_eq!(
            secret.credential_mode(),
            CredentialMode::Basic {
                username: "",
                password: "s3cret"
            }
        );
    }

    #[test]
    fn test_bearer_wins_over_basic() {
        let secret = WebhookSecret::new(SIGNING)
            .with_basic("alice", "s3cret")
            .with_bearer("token-123");
        assert!(secret.has_conflicting_credentials());
        assert_eq!(secret.credential_mode(), CredentialMode::Bearer("token-123"));
    }

    #[test]
    fn test_empty_strings_are_not_configured() {
        let secret = WebhookSecret::new(SIGNING)
            .with_bearer("")
            .with_basic("", "");
        assert!(!secret.has_conflicting_credentials());
        assert_eq!(secret.credential_mode(), CredentialMode::None);
    }

    #[test]
    fn test_invalid_signing_key() {
        let secret = WebhookSecret::new("not base64!");
        assert!(secret.signing_key().is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let secret = WebhookSecret::new(SIGNING)
            .with_bearer("token-123")
            .with_basic("alice", "s3cret");
        let debug = format!("{secret:?}");
        assert!(!debug.contains(SIGNING));
        assert!(!debug.contains("token-123"));
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_deserialize_secret() {
        let secret: WebhookSecret =
            serde_json::from_str(r#"{"signing": "c2lnbmluZy1rZXk=", "bearer": "t"}"#)
                .expect("valid secret json");
        assert_eq!(secret.signing, SIGNING);
        assert_eq!(secret.credential_mode(), CredentialMode::Bearer("t"));
    }
}
