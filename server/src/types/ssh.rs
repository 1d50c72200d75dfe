//! SSH payloads carried by enrichment and authorization calls.
//!
//! Key material arrives as raw SSH wire-format bytes. Parsed keys are attached
//! by the router after the signature has been verified; they are never read
//! from or written to JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ssh_key::PublicKey;

use super::encoding::{base64_bytes, null_as_default};

/// An SSH certificate request submitted for enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshCertificateRequest {
    #[serde(default, with = "base64_bytes")]
    pub public_key: Vec<u8>,
    /// `user` or `host`.
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub cert_type: String,
    #[serde(default, rename = "keyID", deserialize_with = "null_as_default")]
    pub key_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub principals: Vec<String>,
    #[serde(skip)]
    parsed_public_key: Option<PublicKey>,
}

impl SshCertificateRequest {
    /// The parsed `public_key`, once the router has attached it.
    #[must_use]
    pub const fn parsed_public_key(&self) -> Option<&PublicKey> {
        self.parsed_public_key.as_ref()
    }

    pub(crate) fn attach_public_key(&mut self, key: PublicKey) {
        self.parsed_public_key = Some(key);
    }
}

/// The SSH certificate the authority is about to issue, submitted for
/// authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshCertificate {
    #[serde(default, with = "base64_bytes")]
    pub public_key: Vec<u8>,
    #[serde(default, with = "base64_bytes")]
    pub signature_key: Vec<u8>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub serial: u64,
    /// `user` or `host`.
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub cert_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub principals: Vec<String>,
    /// Unix seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub valid_after: u64,
    /// Unix seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub valid_before: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub critical_options: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: BTreeMap<String, String>,
    #[serde(skip)]
    parsed_public_key: Option<PublicKey>,
    #[serde(skip)]
    parsed_signature_key: Option<PublicKey>,
}

impl SshCertificate {
    /// The parsed `public_key`, if one was present.
    #[must_use]
    pub const fn parsed_public_key(&self) -> Option<&PublicKey> {
        self.parsed_public_key.as_ref()
    }

    /// The parsed `signature_key`, if one was present.
    #[must_use]
    pub const fn parsed_signature_key(&self) -> Option<&PublicKey> {
        self.parsed_signature_key.as_ref()
    }

    pub(crate) fn attach_public_key(&mut self, key: PublicKey) {
        self.parsed_public_key = Some(key);
    }

    pub(crate) fn attach_signature_key(&mut self, key: PublicKey) {
        self.parsed_signature_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_certificate_request_field_names() {
        let request: SshCertificateRequest = serde_json::from_value(serde_json::json!({
            "publicKey": testing::SSH_USER_KEY_WIRE,
            "type": "user",
            "keyID": "alice@example.com",
            "principals": ["alice", "admin"],
        }))
        .expect("valid request");

        assert_eq!(request.cert_type, "user");
        assert_eq!(request.key_id, "alice@example.com");
        assert_eq!(request.principals, vec!["alice", "admin"]);
        assert!(!request.public_key.is_empty());
        assert!(request.parsed_public_key().is_none());
    }

    #[test]
    fn test_certificate_field_names() {
        let certificate: SshCertificate = serde_json::from_value(serde_json::json!({
            "publicKey": testing::SSH_USER_KEY_WIRE,
            "signatureKey": testing::SSH_CA_KEY_WIRE,
            "type": "host",
            "keyId": "web-1",
            "principals": null,
            "validAfter": 1_700_000_000u64,
            "validBefore": 1_700_086_400u64,
            "extensions": {"permit-pty": ""},
        }))
        .expect("valid certificate");

        assert_eq!(certificate.cert_type, "host");
        assert_eq!(certificate.key_id, "web-1");
        assert!(certificate.principals.is_empty());
        assert_eq!(certificate.valid_before - certificate.valid_after, 86_400);
        assert!(certificate.extensions.contains_key("permit-pty"));
        assert!(certificate.parsed_public_key().is_none());
        assert!(certificate.parsed_signature_key().is_none());
    }

    #[test]
    fn test_parsed_keys_are_not_serialized() {
        let mut certificate = SshCertificate::default();
        certificate.attach_public_key(testing::ssh_user_key());

        let json = serde_json::to_value(&certificate).expect("serialize");
        assert!(json.get("parsedPublicKey").is_none());
        assert!(certificate.parsed_public_key().is_some());
    }
}
