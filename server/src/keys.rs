//! Parsing of certificate key material carried in webhook payloads.

use ssh_key::PublicKey;
use x509_cert::der::Decode;
use x509_cert::request::CertReq;

/// Error returned when key material in a payload cannot be parsed.
#[derive(Debug)]
pub enum KeyParseError {
    /// The DER-encoded certificate signing request is invalid.
    Csr(x509_cert::der::Error),
    /// The SSH wire-format public key is invalid.
    SshPublicKey(ssh_key::Error),
}

impl std::fmt::Display for KeyParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csr(e) => write!(f, "invalid certificate signing request: {e}"),
            Self::SshPublicKey(e) => write!(f, "invalid SSH public key: {e}"),
        }
    }
}

impl std::error::Error for KeyParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csr(e) => Some(e),
            Self::SshPublicKey(e) => Some(e),
        }
    }
}

/// Parse a DER-encoded PKCS#10 certificate signing request.
///
/// # Errors
/// Returns `KeyParseError::Csr` if the bytes are not a valid request.
pub fn parse_csr(der: &[u8]) -> Result<CertReq, KeyParseError> {
    CertReq::from_der(der).map_err(KeyParseError::Csr)
}

/// Parse an SSH public key in wire format (as found in `authorized_keys`
/// after base64 decoding).
///
/// # Errors
/// Returns `KeyParseError::SshPublicKey` if the bytes are not a valid key.
pub fn parse_ssh_public_key(bytes: &[u8]) -> Result<PublicKey, KeyParseError> {
    PublicKey::from_bytes(bytes).map_err(KeyParseError::SshPublicKey)
}
