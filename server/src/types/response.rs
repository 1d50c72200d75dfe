//! The JSON body returned to the certificate authority.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a webhook call.
///
/// `data` is only meaningful on enrichment routes and is `null` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub allow: bool,
}

impl ResponseBody {
    /// Response for an enrichment route.
    #[must_use]
    pub const fn enrichment(data: Option<Value>, found: bool) -> Self {
        Self { data, allow: found }
    }

    /// Response for an authorization route.
    #[must_use]
    pub const fn decision(allow: bool) -> Self {
        Self { data: None, allow }
    }
}

impl IntoResponse for ResponseBody {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self) {
            Ok(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                bytes,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response body");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
