//! Response handling and transformation.
//!
//! # Responsibilities
//! - Decide whether an upstream response is rewritten or streamed through
//! - Buffer, rewrite and re-frame eligible HTML bodies
//!
//! # Design Decisions
//! - Only `text/html` bodies are ever buffered; everything else streams
//! - Compressed or oversized HTML streams through unrewritten
//! - A body read failure fails the response; nothing partial is emitted

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Response, StatusCode};

use crate::config::RewriteConfig;
use crate::error::ProxyError;
use crate::observability::metrics;
use crate::rewrite::{engine, PatternSet};

/// What to do with an upstream response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Buffer the body and run the rewrite engine.
    Rewrite,
    /// Stream the body untouched, with the reason.
    Passthrough(&'static str),
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Whether a response to `method` with `status` has a body to rewrite.
///
/// HEAD answers and 1xx/204/304 responses keep the upstream framing headers
/// untouched.
pub fn carries_body(method: &Method, status: StatusCode) -> bool {
    !(*method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// Classify a response by its headers.
pub fn disposition(headers: &HeaderMap, config: &RewriteConfig) -> Disposition {
    if !engine::is_html(content_type(headers)) {
        return Disposition::Passthrough("not_html");
    }
    if !config.enabled {
        return Disposition::Passthrough("disabled");
    }

    let encoded = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().eq_ignore_ascii_case("identity"));
    if encoded {
        return Disposition::Passthrough("encoded");
    }

    let declared_len = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > config.max_body_bytes) {
        return Disposition::Passthrough("too_large");
    }

    Disposition::Rewrite
}

/// Buffer an HTML response, rewrite its URLs and fix up `Content-Length`.
pub async fn rewrite_response(
    response: Response<Body>,
    patterns: &PatternSet,
    max_body_bytes: usize,
) -> Result<Response<Body>, ProxyError> {
    let (mut parts, body) = response.into_parts();

    let original = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| ProxyError::BodyRead(e.to_string()))?;
    let original_len = original.len();

    let rewritten = engine::rewrite_body(content_type(&parts.headers), original, patterns);

    metrics::record_rewrite_bytes(original_len, rewritten.len());
    metrics::record_rewrite(if rewritten.len() == original_len { "unchanged" } else { "rewritten" });
    tracing::debug!(
        domain = %patterns.domain(),
        bytes_in = original_len,
        bytes_out = rewritten.len(),
        "Rewrote HTML body"
    );

    parts.headers.remove(header::TRANSFER_ENCODING);
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));

    Ok(Response::from_parts(parts, Body::from(rewritten)))
}
