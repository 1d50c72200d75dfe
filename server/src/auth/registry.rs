//! Webhook secret registry.
//!
//! Maps webhook IDs to the shared secret used to authenticate calls from the
//! certificate authority.
//!
//! # Pre-conditions
//! - Secrets are loaded once at startup, before the listener is bound.
//!
//! # Post-conditions
//! - The registry is read-only after construction and may be shared across
//!   request handlers without synchronization.
//!
//! # Invariants
//! - Every webhook ID is non-empty.
//! - Every secret has a non-empty signing key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::WebhookSecret;

/// Errors that can occur when loading the secret registry.
#[derive(Debug)]
pub enum SecretRegistryError {
    /// The secrets file could not be read.
    Io {
        /// Path of the secrets file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The secrets document is not valid JSON of the expected shape.
    Json(serde_json::Error),
    /// A secret was registered under an empty webhook ID.
    EmptyWebhookId,
    /// A secret has no signing key.
    EmptySigningKey(String),
}

impl std::fmt::Display for SecretRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read secrets file {}: {source}", path.display())
            }
            Self::Json(e) => write!(f, "invalid secrets document: {e}"),
            Self::EmptyWebhookId => write!(f, "webhook ID must not be empty"),
            Self::EmptySigningKey(id) => write!(f, "missing signing key for webhook {id}"),
        }
    }
}

impl std::error::Error for SecretRegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(e) => Some(e),
            Self::EmptyWebhookId | Self::EmptySigningKey(_) => None,
        }
    }
}

impl From<serde_json::Error> for SecretRegistryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Read-only mapping from webhook ID to [`WebhookSecret`].
#[derive(Debug, Default)]
pub struct SecretRegistry {
    secrets: HashMap<String, WebhookSecret>,
}

impl SecretRegistry {
    /// Build a registry from already-loaded secrets.
    ///
    /// # Errors
    /// Returns an error if a webhook ID is empty or a secret has no signing key.
    pub fn new(secrets: HashMap<String, WebhookSecret>) -> Result<Self, SecretRegistryError> {
        for (id, secret) in &secrets {
            if id.is_empty() {
                return Err(SecretRegistryError::EmptyWebhookId);
            }
            if secret.signing.is_empty() {
                return Err(SecretRegistryError::EmptySigningKey(id.clone()));
            }
            if secret.signing_key().is_err() {
                // Requests for this ID fail with a 500.
                tracing::warn!(webhook_id = %id, "signing key is not valid base64");
            }
            if secret.has_conflicting_credentials() {
                tracing::warn!(
                    webhook_id = %id,
                    "both bearer and basic credentials configured; only the bearer token is enforced"
                );
            }
        }
        Ok(Self { secrets })
    }

    /// Parse a registry from a JSON object of `webhook ID -> secret`.
    ///
    /// # Errors
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, SecretRegistryError> {
        let secrets: HashMap<String, WebhookSecret> = serde_json::from_str(json)?;
        Self::new(secrets)
    }

    /// Load a registry from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn from_json_file(path: &Path) -> Result<Self, SecretRegistryError> {
        let json = std::fs::read_to_string(path).map_err(|source| SecretRegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Look up the secret for a webhook ID.
    #[must_use]
    pub fn get(&self, webhook_id: &str) -> Option<&WebhookSecret> {
        self.secrets.get(webhook_id)
    }

    /// Number of configured webhooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether no webhooks are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SECRETS_JSON: &str = r#"{
        "8509cf3b-c657-4f69-bf78-636be7cd91fc": {
            "signing": "G0syl5ee8W1zFTMjhJXpYFuK0QVmZfG++ImzslyVyyciv58ftmX7NMXKJeWCA/A3shjX+xrsoGO0f1+nfu/FSw=="
        },
        "bearer-hook": {"signing": "c2lnbmluZw==", "bearer": "token-123"}
    }"#;

    #[test]
    fn test_from_json_str() {
        let registry = SecretRegistry::from_json_str(SECRETS_JSON).expect("valid registry");
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert!(registry.get("8509cf3b-c657-4f69-bf78-636be7cd91fc").is_some());
        assert_eq!(
            registry
                .get("bearer-hook")
                .and_then(|s| s.bearer.as_deref()),
            Some("token-123")
        );
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_rejects_empty_webhook_id() {
        let result = SecretRegistry::from_json_str(r#"{"": {"signing": "c2lnbmluZw=="}}"#);
        assert!(matches!(result, Err(SecretRegistryError::EmptyWebhookId)));
    }

    #[test]
    fn test_new_validates_programmatic_secrets() {
        let empty_id = HashMap::from([(String::new(), WebhookSecret::new("c2lnbmluZw=="))]);
        assert!(matches!(
            SecretRegistry::new(empty_id),
            Err(SecretRegistryError::EmptyWebhookId)
        ));

        let empty_key = HashMap::from([("hook".to_string(), WebhookSecret::default())]);
        assert!(matches!(
            SecretRegistry::new(empty_key),
            Err(SecretRegistryError::EmptySigningKey(id)) if id == "hook"
        ));
    }

    #[test]
    fn test_rejects_empty_signing_key() {
        let result = SecretRegistry::from_json_str(r#"{"hook": {"signing": ""}}"#);
        match result {
            Err(SecretRegistryError::EmptySigningKey(id)) => assert_eq!(id, "hook"),
            other => panic!("expected EmptySigningKey, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_missing_signing_field() {
        let result = SecretRegistry::from_json_str(r#"{"hook": {"bearer": "t"}}"#);
        assert!(matches!(result, Err(SecretRegistryError::Json(_))));
    }

    #[test]
    fn test_accepts_undecodable_signing_key() {
        let registry = SecretRegistry::from_json_str(r#"{"hook": {"signing": "%%%"}}"#)
            .expect("bad base64 is reported per request, not at load");
        assert!(registry.get("hook").is_some());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SECRETS_JSON.as_bytes()).expect("write secrets");

        let registry = SecretRegistry::from_json_file(file.path()).expect("valid registry");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing.json");

        let result = SecretRegistry::from_json_file(&path);
        assert!(matches!(result, Err(SecretRegistryError::Io { .. })));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SecretRegistryError::EmptyWebhookId.to_string(),
            "webhook ID must not be empty"
        );
        assert_eq!(
            SecretRegistryError::EmptySigningKey("hook".to_string()).to_string(),
            "missing signing key for webhook hook"
        );
    }
}
