//! Pluggable lookup and authorization behaviour.
//!
//! The router owns no identity data or policy. It calls into an injected
//! [`WebhookCallbacks`] implementation for every authenticated request.
//!
//! # Pre-conditions
//! - Implementations are safe to call concurrently from many requests.
//!
//! # Post-conditions
//! - A returned error aborts the request with a generic 500; its text is
//!   logged and never sent to the caller.

use serde_json::Value;
use x509_cert::request::CertReq;

use crate::types::{SshCertificate, SshCertificateRequest, X509Certificate};

/// Error type returned by callback implementations.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Result of an enrichment lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    /// Data attached to the certificate template. `None` is sent as `null`.
    pub data: Option<Value>,
    /// Whether the identity exists. Sent to the caller as `allow`.
    pub found: bool,
}

impl Enrichment {
    /// The identity exists and carries `data`.
    #[must_use]
    pub const fn found(data: Value) -> Self {
        Self {
            data: Some(data),
            found: true,
        }
    }

    /// The identity does not exist.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            data: None,
            found: false,
        }
    }
}

/// Lookup and authorization capabilities consulted by the router.
pub trait WebhookCallbacks: Send + Sync {
    /// Look up enrichment data for an X.509 CSR, keyed by identity.
    fn lookup_x509(&self, key: &str, csr: &CertReq) -> Result<Enrichment, CallbackError>;

    /// Look up enrichment data for an SSH certificate request, keyed by identity.
    ///
    /// The request's parsed public key is always attached.
    fn lookup_ssh(
        &self,
        key: &str,
        request: &SshCertificateRequest,
    ) -> Result<Enrichment, CallbackError>;

    /// Decide whether an X.509 certificate may be issued.
    fn allow_x509(&self, certificate: &X509Certificate) -> Result<bool, CallbackError>;

    /// Decide whether an SSH certificate may be issued.
    ///
    /// Parsed keys are attached for every key present in the payload.
    fn allow_ssh(&self, certificate: &SshCertificate) -> Result<bool, CallbackError>;
}
