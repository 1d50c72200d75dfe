//! Common helpers for end-to-end tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use x509_cert::request::CertReq;

use crate::auth::{
    Authenticator, SIGNATURE_HEADER, SecretRegistry, WEBHOOK_ID_HEADER, WebhookSecret, sign,
};
use crate::callbacks::{CallbackError, Enrichment, WebhookCallbacks};
use crate::directory::Directory;
use crate::router::router;
use crate::testing;
use crate::types::{SshCertificate, SshCertificateRequest, X509Certificate};

/// Webhook configured with a bearer token.
pub const BEARER_WEBHOOK_ID: &str = "bearer-hook";
pub const BEARER_TOKEN: &str = "token-123";

/// Webhook configured with basic credentials.
pub const BASIC_WEBHOOK_ID: &str = "basic-hook";
pub const BASIC_USERNAME: &str = "step";
pub const BASIC_PASSWORD: &str = "hunter2";

/// Webhook whose signing secret is not valid base64.
pub const BROKEN_WEBHOOK_ID: &str = "broken-hook";

#[must_use]
pub fn registry() -> SecretRegistry {
    let secrets = HashMap::from([
        (
            testing::WEBHOOK_ID.to_string(),
            WebhookSecret::new(testing::SIGNING_SECRET),
        ),
        (
            BEARER_WEBHOOK_ID.to_string(),
            WebhookSecret::new(testing::SIGNING_SECRET).with_bearer(BEARER_TOKEN),
        ),
        (
            BASIC_WEBHOOK_ID.to_string(),
            WebhookSecret::new(testing::SIGNING_SECRET).with_basic(BASIC_USERNAME, BASIC_PASSWORD),
        ),
        (
            BROKEN_WEBHOOK_ID.to_string(),
            WebhookSecret::new("not base64!"),
        ),
    ]);
    #[allow(clippy::expect_used)]
    SecretRegistry::new(secrets).expect("valid registry")
}

/// Directory knowing `alice` (with data) and `carol` (without data).
#[must_use]
pub fn directory() -> Directory {
    #[allow(clippy::expect_used)]
    Directory::from_json_str(
        r#"{
            "alice": {"role": "eng", "groups": ["admin"]},
            "alice@example.com": {"email": true},
            "carol": null
        }"#,
    )
    .expect("valid directory")
}

/// Router under test.
pub struct TestApp {
    router: Router,
}

/// Status and raw body of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub body: Bytes,
}

impl TestResponse {
    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        #[allow(clippy::expect_used)]
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App backed by the test directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_callbacks(Arc::new(directory()))
    }

    #[must_use]
    pub fn with_callbacks(callbacks: Arc<dyn WebhookCallbacks>) -> Self {
        Self::with_authenticator(Authenticator::new(Arc::new(registry())), callbacks)
    }

    #[must_use]
    pub fn with_authenticator(
        authenticator: Authenticator,
        callbacks: Arc<dyn WebhookCallbacks>,
    ) -> Self {
        Self {
            router: router(authenticator, callbacks),
        }
    }

    /// Send a request and collect the response.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        #[allow(clippy::expect_used)]
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        #[allow(clippy::expect_used)]
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");

        TestResponse {
            status,
            content_type,
            location,
            body,
        }
    }

    /// POST `body` to `path`, signed for the default webhook.
    pub async fn post_signed(&self, path: &str, body: &Value) -> TestResponse {
        let body = body.to_string();
        #[allow(clippy::expect_used)]
        let request = signed_request(path, testing::WEBHOOK_ID, body.as_bytes())
            .body(Body::from(body))
            .expect("valid request");
        self.send(request).await
    }
}

/// Hex HMAC of `body` under the test signing secret.
#[must_use]
pub fn signature(body: &[u8]) -> String {
    #[allow(clippy::expect_used)]
    sign(&testing::signing_key(), body).expect("valid key")
}

/// A POST builder carrying the webhook ID and a valid signature for `body`.
#[must_use]
pub fn signed_request(path: &str, webhook_id: &str, body: &[u8]) -> axum::http::request::Builder {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(WEBHOOK_ID_HEADER, webhook_id)
        .header(SIGNATURE_HEADER, signature(body))
}

/// Envelope for X.509 enrichment carrying the fixture CSR.
#[must_use]
pub fn x509_enrich_body() -> Value {
    json!({
        "timestamp": "2024-01-01T00:00:00Z",
        "provisionerName": "my-provisioner",
        "x509CertificateRequest": {
            "raw": testing::CSR_DER_BASE64,
            "publicKeyAlgorithm": "ECDSA",
            "subject": {"commonName": "alice@example.com"},
            "dnsNames": ["alice.example.com"]
        }
    })
}

/// Envelope for SSH enrichment carrying the fixture user key.
#[must_use]
pub fn ssh_enrich_body() -> Value {
    json!({
        "timestamp": "2024-01-01T00:00:00Z",
        "sshCertificateRequest": {
            "publicKey": testing::SSH_USER_KEY_WIRE,
            "type": "user",
            "keyID": "alice",
            "principals": ["alice", "ops"]
        }
    })
}

/// Envelope for X.509 authorization with the given subject common name.
#[must_use]
pub fn x509_authorize_body(common_name: &str) -> Value {
    json!({
        "timestamp": "2024-01-01T00:00:00Z",
        "x509Certificate": {
            "subject": {"commonName": common_name, "organization": "Example"},
            "issuer": {"commonName": "Example Intermediate CA"},
            "dnsNames": ["alice.example.com"],
            "publicKeyAlgorithm": "ECDSA",
            "notBefore": "2024-01-01T00:00:00Z",
            "notAfter": "2024-01-02T00:00:00Z"
        }
    })
}

/// Envelope for SSH authorization with the given key fields.
#[must_use]
pub fn ssh_authorize_body(public_key: &str, signature_key: &str) -> Value {
    json!({
        "timestamp": "2024-01-01T00:00:00Z",
        "sshCertificate": {
            "publicKey": public_key,
            "signatureKey": signature_key,
            "serial": 42,
            "type": "user",
            "keyId": "alice",
            "principals": ["alice"],
            "validAfter": 1_704_067_200,
            "validBefore": 1_704_153_600,
            "criticalOptions": {},
            "extensions": {"permit-pty": ""}
        }
    })
}

/// Callbacks that count invocations and always fail.
#[derive(Default)]
pub struct FailingCallbacks {
    pub calls: AtomicUsize,
}

impl FailingCallbacks {
    fn fail<T>(&self) -> Result<T, CallbackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("directory backend unavailable".into())
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WebhookCallbacks for FailingCallbacks {
    fn lookup_x509(&self, _key: &str, _csr: &CertReq) -> Result<Enrichment, CallbackError> {
        self.fail()
    }

    fn lookup_ssh(
        &self,
        _key: &str,
        _request: &SshCertificateRequest,
    ) -> Result<Enrichment, CallbackError> {
        self.fail()
    }

    fn allow_x509(&self, _certificate: &X509Certificate) -> Result<bool, CallbackError> {
        self.fail()
    }

    fn allow_ssh(&self, _certificate: &SshCertificate) -> Result<bool, CallbackError> {
        self.fail()
    }
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Install a plain-text subscriber writing into this capture for the
    /// current thread until the guard drops.
    #[must_use]
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[must_use]
    pub fn output(&self) -> String {
        #[allow(clippy::expect_used)]
        let buf = self.buf.lock().expect("log buffer");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        #[allow(clippy::expect_used)]
        self.buf.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
