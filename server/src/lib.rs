// Life of a request:
// 1. The certificate authority POSTs a signed JSON envelope
// 2. Authenticate: webhook ID, optional bearer/basic credentials, HMAC
// 3. Decode the envelope and pick the route from the path prefix
// 4. Parse the key material the route needs
// 5. Enrichment routes look up the identity; authorization routes ask the policy
// 6. Respond with {"data": ..., "allow": ...}
//
// System components:
//  - Secret registry and authenticator
//  - Dispatch router
//  - Pluggable callbacks (the identity directory by default)

pub mod auth;
pub mod callbacks;
pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod keys;
pub mod router;
pub mod types;

mod e2e_tests;
#[cfg(test)]
mod testing;

pub use auth::{Authenticator, SecretRegistry};
pub use callbacks::{CallbackError, Enrichment, WebhookCallbacks};
pub use directory::Directory;
pub use error::WebhookError;
pub use router::{Route, router};
