//! Request handling and transformation.
//!
//! # Responsibilities
//! - Attach a unique request ID (UUID v4) and echo it on the response
//! - Retarget the inbound request at `https://<domain><remaining path>`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Method, body and all other headers are forwarded unchanged

use axum::body::Body;
use axum::http::{
    header::{self, HeaderName, HeaderValue},
    uri::{Scheme, Uri},
    Request, Version,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::error::ProxyError;
use crate::routing::ProxyTarget;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns an `x-request-id` when the client sent none.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// The request's ID, or `"unknown"` outside the request ID layers.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Rewrite an inbound request so it targets the upstream domain.
///
/// Scheme becomes `https`, authority and `Host` become the domain, the path
/// becomes the remaining path and the query is kept.
pub fn build_outbound(request: Request<Body>, target: &ProxyTarget) -> Result<Request<Body>, ProxyError> {
    let (mut parts, body) = request.into_parts();

    let path_and_query = target.path_and_query(parts.uri.query());
    let uri = Uri::builder()
        .scheme(Scheme::HTTPS)
        .authority(target.domain.as_str())
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| ProxyError::InvalidPath(format!("/{}: {}", target.domain, e)))?;
    let host = HeaderValue::from_str(&target.domain)
        .map_err(|e| ProxyError::InvalidPath(format!("/{}: {}", target.domain, e)))?;

    parts.uri = uri;
    // upstream connections negotiate HTTP/1.1
    parts.version = Version::HTTP_11;
    parts.headers.insert(header::HOST, host);

    Ok(Request::from_parts(parts, body))
}
