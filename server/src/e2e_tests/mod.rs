//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving the full router with
//! signed requests and deterministic fixtures.

#![cfg(test)]

mod helpers;

mod test_authentication;
mod test_authorize_ssh;
mod test_authorize_x509;
mod test_callback_failures;
mod test_determinism;
mod test_enrich_ssh;
mod test_enrich_x509;
mod test_freshness;
mod test_logging;
