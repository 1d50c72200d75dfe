//! Dispatch of authenticated webhook calls to the injected callbacks.
//!
//! Life of a call:
//! 1. Pick the route from the path prefix.
//! 2. Authenticate and decode the body.
//! 3. For enrichment, take the identity key from the last path segment.
//! 4. Parse the key material the route needs.
//! 5. Invoke the callback and encode its result.
//!
//! Any failure ends the call with the status from [`WebhookError::status`].

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::auth::Authenticator;
use crate::callbacks::WebhookCallbacks;
use crate::error::WebhookError;
use crate::identity::identity_key;
use crate::keys::{parse_csr, parse_ssh_public_key};
use crate::types::{RequestEnvelope, ResponseBody};

/// The four webhook operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/{identity}`: enrich an X.509 CSR.
    EnrichX509,
    /// `/ssh/{identity}`: enrich an SSH certificate request.
    EnrichSsh,
    /// `/auth/...`: authorize an X.509 certificate.
    AuthorizeX509,
    /// `/auth-ssh/...`: authorize an SSH certificate.
    AuthorizeSsh,
}

impl Route {
    /// Select the route for a request path by longest matching prefix.
    #[must_use]
    pub fn resolve(path: &str) -> Self {
        if path.starts_with("/auth-ssh/") {
            Self::AuthorizeSsh
        } else if path.starts_with("/auth/") {
            Self::AuthorizeX509
        } else if path.starts_with("/ssh/") {
            Self::EnrichSsh
        } else {
            Self::EnrichX509
        }
    }

    /// Location a bare route prefix (`/ssh`, `/auth`, `/auth-ssh`) redirects
    /// to, with the query string kept.
    #[must_use]
    pub fn redirect_target(uri: &Uri) -> Option<String> {
        let path = uri.path();
        if !matches!(path, "/ssh" | "/auth" | "/auth-ssh") {
            return None;
        }
        Some(match uri.query() {
            Some(query) => format!("{path}/?{query}"),
            None => format!("{path}/"),
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnrichX509 => "enrich-x509",
            Self::EnrichSsh => "enrich-ssh",
            Self::AuthorizeX509 => "authorize-x509",
            Self::AuthorizeSsh => "authorize-ssh",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
struct AppState {
    authenticator: Arc<Authenticator>,
    callbacks: Arc<dyn WebhookCallbacks>,
}

/// Build the webhook router.
///
/// Every path is served; the route is chosen by [`Route::resolve`]. Bare
/// route prefixes are redirected to their trailing-slash form first.
pub fn router(authenticator: Authenticator, callbacks: Arc<dyn WebhookCallbacks>) -> Router {
    let state = AppState {
        authenticator: Arc::new(authenticator),
        callbacks,
    };
    Router::new().fallback(dispatch).with_state(state)
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    if let Some(location) = Route::redirect_target(&uri) {
        tracing::debug!(from = uri.path(), to = %location, "redirecting to route prefix");
        return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response();
    }

    let route = Route::resolve(uri.path());
    let span = tracing::info_span!(
        "webhook",
        route = %route,
        webhook_id = tracing::field::Empty,
        identity = tracing::field::Empty,
    );

    async move {
        match handle(&state, route, &method, uri.path(), &headers, body).await {
            Ok(response) => response.into_response(),
            Err(error) => {
                error.log();
                error.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn handle(
    state: &AppState,
    route: Route,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<ResponseBody, WebhookError> {
    if method != Method::POST {
        return Err(WebhookError::MethodNotAllowed);
    }

    let request = state.authenticator.authenticate(headers, body).await?;
    let callbacks = state.callbacks.as_ref();

    let response = match route {
        Route::EnrichX509 => enrich_x509(callbacks, path, request.envelope)?,
        Route::EnrichSsh => enrich_ssh(callbacks, path, request.envelope)?,
        Route::AuthorizeX509 => authorize_x509(callbacks, request.envelope)?,
        Route::AuthorizeSsh => authorize_ssh(callbacks, request.envelope)?,
    };

    tracing::info!(allow = response.allow, "webhook handled");
    tracing::debug!(data = ?response.data, "response data");
    Ok(response)
}

fn enrich_x509(
    callbacks: &dyn WebhookCallbacks,
    path: &str,
    envelope: RequestEnvelope,
) -> Result<ResponseBody, WebhookError> {
    let key = identity_key(path);
    tracing::Span::current().record("identity", key.as_ref());

    let request = envelope.into_x509_certificate_request();
    let csr = parse_csr(&request.raw).map_err(WebhookError::InvalidCsr)?;

    let enrichment = callbacks
        .lookup_x509(&key, &csr)
        .map_err(WebhookError::Callback)?;
    Ok(ResponseBody::enrichment(enrichment.data, enrichment.found))
}

fn enrich_ssh(
    callbacks: &dyn WebhookCallbacks,
    path: &str,
    envelope: RequestEnvelope,
) -> Result<ResponseBody, WebhookError> {
    let key = identity_key(path);
    tracing::Span::current().record("identity", key.as_ref());

    let mut request = envelope.into_ssh_certificate_request();
    let public_key =
        parse_ssh_public_key(&request.public_key).map_err(WebhookError::InvalidSshRequestKey)?;
    request.attach_public_key(public_key);

    let enrichment = callbacks
        .lookup_ssh(&key, &request)
        .map_err(WebhookError::Callback)?;
    Ok(ResponseBody::enrichment(enrichment.data, enrichment.found))
}

fn authorize_x509(
    callbacks: &dyn WebhookCallbacks,
    envelope: RequestEnvelope,
) -> Result<ResponseBody, WebhookError> {
    let certificate = envelope.into_x509_certificate();
    let allow = callbacks
        .allow_x509(&certificate)
        .map_err(WebhookError::Callback)?;
    Ok(ResponseBody::decision(allow))
}

fn authorize_ssh(
    callbacks: &dyn WebhookCallbacks,
    envelope: RequestEnvelope,
) -> Result<ResponseBody, WebhookError> {
    let mut certificate = envelope.into_ssh_certificate();

    // Keys are parsed before the policy sees the certificate.
    if !certificate.public_key.is_empty() {
        let key = parse_ssh_public_key(&certificate.public_key)
            .map_err(WebhookError::InvalidSshCertificateKey)?;
        certificate.attach_public_key(key);
    }
    if !certificate.signature_key.is_empty() {
        let key = parse_ssh_public_key(&certificate.signature_key)
            .map_err(WebhookError::InvalidSshCertificateKey)?;
        certificate.attach_signature_key(key);
    }

    let allow = callbacks
        .allow_ssh(&certificate)
        .map_err(WebhookError::Callback)?;
    Ok(ResponseBody::decision(allow))
}
