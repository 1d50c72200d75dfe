//! Authentication module.
//!
//! Verifies that a webhook call really comes from the certificate authority
//! holding the shared secret for the presented webhook ID.
//!
//! # Pre-conditions
//! - Secrets are loaded into a [`SecretRegistry`] before serving.
//!
//! # Post-conditions
//! - An [`AuthenticatedRequest`] is only produced after signature verification.
//!
//! # Invariants
//! - Authentication configuration is immutable once loaded.

pub mod authenticator;
pub mod credentials;
pub mod freshness;
pub mod registry;
pub mod secret;
pub mod signature;

pub use authenticator::{
    AuthenticatedRequest, Authenticator, DEFAULT_MAX_BODY_BYTES, SIGNATURE_HEADER,
    WEBHOOK_ID_HEADER,
};
pub use credentials::{CredentialError, check_credentials};
pub use freshness::{FreshnessError, check_freshness};
pub use registry::{SecretRegistry, SecretRegistryError};
pub use secret::{CredentialMode, WebhookSecret};
pub use signature::{SignatureError, decode_signature, sign, verify};
