//! The JSON body of a webhook call.
//!
//! One body shape serves all four routes. Only the payload field that matches
//! the dispatching route is read; the others are ignored, and a missing
//! payload is treated as its zero value.
//!
//! # Invariants
//! - An envelope is only constructed from bytes whose signature has already
//!   been verified.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::encoding::{null_as_default, optional_object};
use super::{SshCertificate, SshCertificateRequest, X509Certificate, X509CertificateRequest};

/// The authenticated, decoded body of a webhook call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// Time the authority sent the call (RFC 3339).
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(
        default,
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub x509_certificate_request: Option<X509CertificateRequest>,
    #[serde(
        default,
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub x509_certificate: Option<X509Certificate>,
    #[serde(
        default,
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub ssh_certificate_request: Option<SshCertificateRequest>,
    #[serde(
        default,
        deserialize_with = "optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub ssh_certificate: Option<SshCertificate>,
    /// Principal the authority authorized the request for, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_principal: Option<String>,
    /// Name of the provisioner handling the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioner_name: Option<String>,
}

impl RequestEnvelope {
    /// Decode an envelope from raw body bytes.
    ///
    /// The body must be a JSON object.
    ///
    /// # Errors
    /// Returns the JSON error if the body is not a valid envelope.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_slice(body)?;
        serde_json::from_value(Value::Object(object))
    }

    /// The X.509 CSR payload, or an empty one if absent.
    #[must_use]
    pub fn into_x509_certificate_request(self) -> X509CertificateRequest {
        self.x509_certificate_request.unwrap_or_default()
    }

    /// The X.509 certificate payload, or an empty one if absent.
    #[must_use]
    pub fn into_x509_certificate(self) -> X509Certificate {
        self.x509_certificate.unwrap_or_default()
    }

    /// The SSH certificate request payload, or an empty one if absent.
    #[must_use]
    pub fn into_ssh_certificate_request(self) -> SshCertificateRequest {
        self.ssh_certificate_request.unwrap_or_default()
    }

    /// The SSH certificate payload, or an empty one if absent.
    #[must_use]
    pub fn into_ssh_certificate(self) -> SshCertificate {
        self.ssh_certificate.unwrap_or_default()
    }
}
