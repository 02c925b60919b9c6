//! Error types for the proxy paths.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Boxed error carried by body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures before any response byte reaches the client.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Target URL missing, unparseable, or not http(s).
    #[error("Invalid target URL: {0}")]
    InvalidUrl(String),

    /// DNS, TLS, connect, or redirect failure while reaching the origin.
    #[error("Failed to reach origin: {0}")]
    Connect(#[source] reqwest::Error),

    /// Origin did not answer within the bounded wait.
    #[error("Origin did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    /// Image body could not be read completely.
    #[error("Failed to read origin body: {0}")]
    Body(#[source] reqwest::Error),

    /// Outbound HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProxyError {
    /// Classify a request-phase transport error.
    pub(crate) fn from_send(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProxyError::Timeout(timeout)
        } else {
            ProxyError::Connect(err)
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidUrl(_) => "invalid_url",
            ProxyError::Connect(_) => "connect",
            ProxyError::Timeout(_) => "timeout",
            ProxyError::Body(_) => "body",
            ProxyError::Client(_) => "client",
        }
    }

    /// Status returned to the client for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::Connect(_) | ProxyError::Body(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

/// Failures while the body is already streaming to the client.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Upstream connection dropped partway through the body.
    #[error("Upstream body failed mid-stream: {0}")]
    MidStream(#[source] BoxError),
}

/// JSON error body shared by every handler: `{"detail": "..."}`.
pub fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    let body = serde_json::json!({ "detail": detail.into() });
    (status, Json(body)).into_response()
}
