//! Shared fixtures for unit and end-to-end tests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ssh_key::PublicKey;

/// Signing secret issued for the example webhook.
pub const SIGNING_SECRET: &str =
    "G0syl5ee8W1zFTMjhJXpYFuK0QVmZfG++ImzslyVyyciv58ftmX7NMXKJeWCA/A3shjX+xrsoGO0f1+nfu/FSw==";

/// Webhook ID the example secret is registered under.
pub const WEBHOOK_ID: &str = "8509cf3b-c657-4f69-bf78-636be7cd91fc";

/// DER CSR with subject `CN=alice@example.com` (P-256), base64-encoded.
pub const CSR_DER_BASE64: &str = "MIHXMH4CAQAwHDEaMBgGA1UEAwwRYWxpY2VAZXhhbXBsZS5jb20wWTATBgcqhkjOPQIBBggqhkjOPQMBBwNCAATnlRT1L/Odg1yT9NhRNKolWJOxBb6W1C4wZ3xemwF+lNu/5c5IvxbDA3wGspapKYU0ni9PZy0wjvf3qvUXyNrwoAAwCgYIKoZIzj0EAwIDSQAwRgIhAPGoVimBvK9xqA8dbx/PDL6cTL4hAF5WaqIVEtCAl1YGAiEA3HSrl1eh1PoKXkgqLNzuR+9PeYBmJ4hJ4Z6LVzTRuGQ=";

/// Ed25519 user key in wire format, base64-encoded.
pub const SSH_USER_KEY_WIRE: &str =
    "AAAAC3NzaC1lZDI1NTE5AAAAIK1wkDC29/yo/yPWhNw2oXO0Hqne+0rP+Nx8Bhel14YK";

/// Ed25519 CA key in wire format, base64-encoded.
pub const SSH_CA_KEY_WIRE: &str =
    "AAAAC3NzaC1lZDI1NTE5AAAAILF5odEvLaQ+IAzU4DdWGr40kPcNJKqnEHFbij3jgJVn";

#[must_use]
pub fn signing_key() -> Vec<u8> {
    decode(SIGNING_SECRET)
}

#[must_use]
pub fn csr_der() -> Vec<u8> {
    decode(CSR_DER_BASE64)
}

#[must_use]
pub fn ssh_user_key_bytes() -> Vec<u8> {
    decode(SSH_USER_KEY_WIRE)
}

#[must_use]
pub fn ssh_user_key() -> PublicKey {
    #[allow(clippy::expect_used)]
    PublicKey::from_openssh(&format!("ssh-ed25519 {SSH_USER_KEY_WIRE}"))
        .expect("fixture is a valid OpenSSH key")
}

#[must_use]
pub fn ssh_ca_key() -> PublicKey {
    #[allow(clippy::expect_used)]
    PublicKey::from_openssh(&format!("ssh-ed25519 {SSH_CA_KEY_WIRE}"))
        .expect("fixture is a valid OpenSSH key")
}

fn decode(encoded: &str) -> Vec<u8> {
    #[allow(clippy::expect_used)]
    BASE64.decode(encoded).expect("fixture is valid base64")
}
