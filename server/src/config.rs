//! Server configuration module.
//!
//! This module provides configuration loading for the webhook server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `STEP_WEBHOOKS_LISTEN_ADDRESS`: Socket address to listen on (default: `0.0.0.0:4443`)
//! - `STEP_WEBHOOKS_SECRETS_FILE`: JSON file of webhook secrets (required)
//! - `STEP_WEBHOOKS_DIRECTORY_FILE`: JSON identity directory (optional)
//! - `STEP_WEBHOOKS_MAX_BODY_BYTES`: Request body limit (default: 1 MiB)
//! - `STEP_WEBHOOKS_MAX_REQUEST_AGE_SECS`: Reject older envelopes (optional)
//!
//! # Invariants
//!
//! - `max_body_bytes` is never zero
//! - `max_request_age`, when set, is at least one second

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::DEFAULT_MAX_BODY_BYTES;

const LISTEN_ADDRESS: &str = "STEP_WEBHOOKS_LISTEN_ADDRESS";
const SECRETS_FILE: &str = "STEP_WEBHOOKS_SECRETS_FILE";
const DIRECTORY_FILE: &str = "STEP_WEBHOOKS_DIRECTORY_FILE";
const MAX_BODY_BYTES: &str = "STEP_WEBHOOKS_MAX_BODY_BYTES";
const MAX_REQUEST_AGE_SECS: &str = "STEP_WEBHOOKS_MAX_REQUEST_AGE_SECS";

/// Server configuration.
///
/// # Pre-conditions
///
/// When constructed via `from_env()`:
/// - `STEP_WEBHOOKS_SECRETS_FILE` must be set
/// - All values must be valid for their respective types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_address: SocketAddr,
    /// Webhook ID to secret mapping, loaded into the secret registry.
    pub secrets_file: PathBuf,
    /// Identity directory. Without one every lookup misses.
    pub directory_file: Option<PathBuf>,
    pub max_body_bytes: usize,
    pub max_request_age: Option<Duration>,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default listen address.
    pub const DEFAULT_LISTEN_ADDRESS: &'static str = "0.0.0.0:4443";

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `STEP_WEBHOOKS_SECRETS_FILE` is not set
    /// - any set value fails to parse
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let listen_address = Self::parse_listen_address(get(LISTEN_ADDRESS))?;
        let secrets_file = get(SECRETS_FILE)
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(SECRETS_FILE.to_string()))?;
        let directory_file = get(DIRECTORY_FILE).map(PathBuf::from);
        let max_body_bytes = Self::parse_max_body_bytes(get(MAX_BODY_BYTES))?;
        let max_request_age = Self::parse_max_request_age(get(MAX_REQUEST_AGE_SECS))?;

        Ok(Self {
            listen_address,
            secrets_file,
            directory_file,
            max_body_bytes,
            max_request_age,
        })
    }

    fn parse_listen_address(value: Option<String>) -> Result<SocketAddr, ConfigError> {
        let value = value.unwrap_or_else(|| Self::DEFAULT_LISTEN_ADDRESS.to_string());
        value.parse().map_err(|_| ConfigError::InvalidValue {
            name: LISTEN_ADDRESS.to_string(),
            message: format!("'{value}' is not a valid socket address"),
        })
    }

    fn parse_max_body_bytes(value: Option<String>) -> Result<usize, ConfigError> {
        let Some(value) = value else {
            return Ok(DEFAULT_MAX_BODY_BYTES);
        };
        match value.parse::<usize>() {
            Ok(bytes) if bytes > 0 => Ok(bytes),
            _ => Err(ConfigError::InvalidValue {
                name: MAX_BODY_BYTES.to_string(),
                message: format!("'{value}' is not a positive byte count"),
            }),
        }
    }

    fn parse_max_request_age(value: Option<String>) -> Result<Option<Duration>, ConfigError> {
        let Some(value) = value else {
            return Ok(None);
        };
        match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
            _ => Err(ConfigError::InvalidValue {
                name: MAX_REQUEST_AGE_SECS.to_string(),
                message: format!("'{value}' is not a positive number of seconds"),
            }),
        }
    }
}
