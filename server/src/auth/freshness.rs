//! Optional replay window on the envelope timestamp.
//!
//! Signatures bind only to the body, so a captured call can be replayed
//! verbatim. When a maximum age is configured, the signed `timestamp` must lie
//! within that distance of the receiver's clock. Disabled by default.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Error returned when an envelope timestamp is outside the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshnessError {
    /// The timestamp is not RFC 3339.
    InvalidTimestamp(String),
    /// The timestamp is older than the window.
    TooOld { age_secs: i64 },
    /// The timestamp is further in the future than the window.
    InFuture { skew_secs: i64 },
}

impl std::fmt::Display for FreshnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp(value) => write!(f, "invalid timestamp '{value}'"),
            Self::TooOld { age_secs } => write!(f, "timestamp is {age_secs}s old"),
            Self::InFuture { skew_secs } => write!(f, "timestamp is {skew_secs}s in the future"),
        }
    }
}

impl std::error::Error for FreshnessError {}

/// Check that `timestamp` is within `max_age` of `now`, in either direction.
///
/// # Errors
/// Returns a `FreshnessError` if the timestamp is unparseable or outside the window.
pub fn check_freshness(
    timestamp: &str,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Result<(), FreshnessError> {
    let sent = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|_| FreshnessError::InvalidTimestamp(timestamp.to_string()))?
        .with_timezone(&Utc);

    let max_secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
    let age_secs = now.signed_duration_since(sent).num_seconds();
    if age_secs > max_secs {
        return Err(FreshnessError::TooOld { age_secs });
    }
    if -age_secs > max_secs {
        return Err(FreshnessError::InFuture {
            skew_secs: -age_secs,
        });
    }
    Ok(())
}
