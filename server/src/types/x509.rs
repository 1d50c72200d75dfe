//! X.509 payloads carried by enrichment and authorization calls.

use serde::{Deserialize, Serialize};

use super::encoding::{base64_bytes, null_as_default, one_or_many};

/// A distinguished name as the certificate authority renders it.
///
/// Multi-valued attributes accept either a string or an array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub country: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub organization: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub organizational_unit: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub locality: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub province: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub street_address: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub postal_code: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub serial_number: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub common_name: String,
}

/// An X.509 certificate signing request submitted for enrichment.
///
/// `raw` is the DER-encoded PKCS#10 request; it is only parsed on the
/// enrich-X.509 route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X509CertificateRequest {
    #[serde(default, with = "base64_bytes")]
    pub raw: Vec<u8>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_key_algorithm: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: Subject,
    #[serde(default, deserialize_with = "one_or_many")]
    pub dns_names: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub email_addresses: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub ip_addresses: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub uris: Vec<String>,
}

/// The certificate the authority is about to issue, submitted for authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X509Certificate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: Subject,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issuer: Subject,
    #[serde(default, deserialize_with = "one_or_many")]
    pub dns_names: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub email_addresses: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub ip_addresses: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub uris: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_key_algorithm: String,
    /// RFC 3339 start of validity.
    #[serde(default, deserialize_with = "null_as_default")]
    pub not_before: String,
    /// RFC 3339 end of validity.
    #[serde(default, deserialize_with = "null_as_default")]
    pub not_after: String,
}
