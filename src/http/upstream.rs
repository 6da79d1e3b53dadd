//! Upstream forwarding.
//!
//! The [`Forwarder`] performs the network call for a prepared request. The
//! production [`HttpsForwarder`] owns connection pooling, TLS and connect
//! timeouts; the proxy core only prepares requests and transforms responses.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Request, Response};
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::future::Future;
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::error::ProxyError;

/// Headers that describe a single hop and are never forwarded.
const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Sends a prepared request upstream and returns the raw response.
pub trait Forwarder: Send + Sync + 'static {
    fn forward(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, ProxyError>> + Send;
}

/// HTTPS client used to reach upstream domains.
#[derive(Clone)]
pub struct HttpsForwarder {
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

impl HttpsForwarder {
    /// Build a pooled HTTPS client with the configured timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .build(HttpsConnector::new_with_connector(http));

        Self { client }
    }
}

impl Forwarder for HttpsForwarder {
    async fn forward(&self, mut request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        strip_hop_by_hop(request.headers_mut());

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
