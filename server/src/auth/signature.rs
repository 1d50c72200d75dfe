//! Webhook signature verification.
//!
//! The certificate authority signs every call with HMAC-SHA256 over the raw
//! request body, keyed with the base64-decoded webhook signing secret, and
//! sends the lowercase hex digest in `X-Smallstep-Signature`.
//!
//! # Invariants
//! - The MAC is always computed over the exact bytes received. Bodies are never
//!   re-serialized before verification.
//! - Comparison is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Error returned when signature verification fails.
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureError {
    /// The signature header is not valid hex.
    InvalidEncoding(hex::FromHexError),
    /// The HMAC could not be keyed with the signing secret.
    InvalidKey,
    /// The signature does not match the body.
    Mismatch,
}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEncoding(e) => write!(f, "signature is not valid hex: {e}"),
            Self::InvalidKey => write!(f, "invalid signing key"),
            Self::Mismatch => write!(f, "signature mismatch"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Decode the hex value of the signature header.
///
/// A missing header decodes to an empty signature, which never verifies.
///
/// # Errors
/// Returns `SignatureError::InvalidEncoding` if the value is not valid hex.
pub fn decode_signature(header: &str) -> Result<Vec<u8>, SignatureError> {
    hex::decode(header).map_err(SignatureError::InvalidEncoding)
}

/// Compute the lowercase hex HMAC-SHA256 signature of `body`.
///
/// # Errors
/// Returns `SignatureError::InvalidKey` if the MAC cannot be keyed.
pub fn sign(key: &[u8], body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify `signature` against the HMAC-SHA256 of `body`.
///
/// # Errors
/// Returns `SignatureError::Mismatch` if the signature does not match.
pub fn verify(key: &[u8], body: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    mac.verify_slice(signature)
        .map_err(|_| SignatureError::Mismatch)
}
