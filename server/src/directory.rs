//! File-backed identity directory.
//!
//! The stock [`WebhookCallbacks`] implementation used by the binary. Maps an
//! identity key to the JSON document returned as enrichment data.
//!
//! # Invariants
//! - The directory is immutable once loaded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use x509_cert::request::CertReq;

use crate::callbacks::{CallbackError, Enrichment, WebhookCallbacks};
use crate::types::{SshCertificate, SshCertificateRequest, X509Certificate};

/// Error returned when loading a directory file fails.
#[derive(Debug)]
pub enum DirectoryError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read directory file {}: {source}", path.display())
            }
            Self::Json(e) => write!(f, "invalid directory JSON: {e}"),
        }
    }
}

impl std::error::Error for DirectoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Identity directory keyed by identity.
///
/// - Enrichment returns the stored document, with `allow` set when the
///   identity exists.
/// - X.509 authorization allows a certificate whose subject common name is
///   a known identity.
/// - SSH authorization allows every certificate.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: HashMap<String, Value>,
}

impl Directory {
    #[must_use]
    pub const fn new(entries: HashMap<String, Value>) -> Self {
        Self { entries }
    }

    /// Parse a JSON object of identity to enrichment document.
    pub fn from_json_str(json: &str) -> Result<Self, DirectoryError> {
        let entries: HashMap<String, Value> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, DirectoryError> {
        let json = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &str) -> Enrichment {
        self.entries
            .get(key)
            .map_or_else(Enrichment::not_found, |data| Enrichment::found(data.clone()))
    }
}

impl WebhookCallbacks for Directory {
    fn lookup_x509(&self, key: &str, _csr: &CertReq) -> Result<Enrichment, CallbackError> {
        Ok(self.lookup(key))
    }

    fn lookup_ssh(
        &self,
        key: &str,
        _request: &SshCertificateRequest,
    ) -> Result<Enrichment, CallbackError> {
        Ok(self.lookup(key))
    }

    fn allow_x509(&self, certificate: &X509Certificate) -> Result<bool, CallbackError> {
        Ok(self.entries.contains_key(&certificate.subject.common_name))
    }

    fn allow_ssh(&self, _certificate: &SshCertificate) -> Result<bool, CallbackError> {
        Ok(true)
    }
}
