//! Shared utilities for integration tests.

use axum::body::Body;
use axum::http::{Method, Request, Response, Uri};
use path_proxy::http::Forwarder;
use path_proxy::{HttpServer, ProxyConfig, ProxyError, Shutdown};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// What the proxy sent upstream.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SeenRequest {
    pub method: Method,
    pub uri: Uri,
    pub host: Option<String>,
    pub request_id: Option<String>,
}

/// Forwarder that answers from a closure and records every request.
pub struct MockForwarder<H> {
    handler: H,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl<H> MockForwarder<H>
where
    H: Fn(Request<Body>) -> Result<Response<Body>, ProxyError> + Send + Sync + 'static,
{
    pub fn new(handler: H) -> (Self, Arc<Mutex<Vec<SeenRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                handler,
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl<H> Forwarder for MockForwarder<H>
where
    H: Fn(Request<Body>) -> Result<Response<Body>, ProxyError> + Send + Sync + 'static,
{
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let seen = SeenRequest {
            method: request.method().clone(),
            uri: request.uri().clone(),
            host: header("host"),
            request_id: header("x-request-id"),
        };
        self.seen.lock().unwrap().push(seen);
        (self.handler)(request)
    }
}

/// Build a response with the given content type and body.
pub fn upstream_response(content_type: &str, body: impl Into<Body>) -> Response<Body> {
    Response::builder()
        .status(200)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap()
}

/// Start the proxy on an ephemeral port.
#[allow(dead_code)]
pub async fn start_proxy<F: Forwarder>(config: ProxyConfig, forwarder: F) -> (SocketAddr, Shutdown) {
    let server = HttpServer::with_forwarder(config, forwarder);
    start_server(server).await
}

pub async fn start_server(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
