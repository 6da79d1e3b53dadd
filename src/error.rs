//! Proxy error types and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors raised while proxying a single request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The request path carries no target domain segment.
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    /// The HTML body could not be read in full from upstream.
    #[error("Failed to read upstream body: {0}")]
    BodyRead(String),

    /// The forwarder failed to reach the upstream host.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// The per-domain URL patterns could not be compiled.
    #[error("Failed to compile URL patterns for {domain}: {source}")]
    Pattern {
        domain: String,
        #[source]
        source: regex::Error,
    },
}

impl ProxyError {
    /// Status code returned to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ProxyError::BodyRead(_) | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Pattern { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::InvalidPath(_) => "Invalid path",
            ProxyError::BodyRead(_) | ProxyError::Upstream(_) => "Upstream request failed",
            ProxyError::Pattern { .. } => "Internal proxy error",
        };
        (self.status(), body).into_response()
    }
}
