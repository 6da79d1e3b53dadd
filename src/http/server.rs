//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Decode the target domain from the path and retarget the request
//! - Hand the request to the forwarder
//! - Rewrite HTML responses, stream everything else

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ProxyConfig, RewriteConfig};
use crate::error::ProxyError;
use crate::http::request::{build_outbound, propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::{carries_body, disposition, rewrite_response, Disposition};
use crate::http::upstream::{Forwarder, HttpsForwarder};
use crate::observability::metrics;
use crate::rewrite::PatternCache;
use crate::routing::route_path;

/// Application state injected into handlers.
pub struct AppState<F> {
    pub forwarder: Arc<F>,
    pub patterns: Arc<PatternCache>,
    pub rewrite: RewriteConfig,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            forwarder: Arc::clone(&self.forwarder),
            patterns: Arc::clone(&self.patterns),
            rewrite: self.rewrite.clone(),
        }
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    patterns: Arc<PatternCache>,
}

impl HttpServer {
    /// Create a server that forwards over HTTPS.
    pub fn new(config: ProxyConfig) -> Self {
        let forwarder = HttpsForwarder::new(&config.timeouts);
        Self::with_forwarder(config, forwarder)
    }

    /// Create a server around a custom forwarder.
    pub fn with_forwarder<F: Forwarder>(config: ProxyConfig, forwarder: F) -> Self {
        let patterns = Arc::new(PatternCache::new(config.rewrite.pattern_cache_capacity));

        let state = AppState {
            forwarder: Arc::new(forwarder),
            patterns: Arc::clone(&patterns),
            rewrite: config.rewrite.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            patterns,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<F: Forwarder>(config: &ProxyConfig, state: AppState<F>) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler::<F>))
            .route("/", any(proxy_handler::<F>))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The shared pattern cache.
    pub fn pattern_cache(&self) -> Arc<PatternCache> {
        Arc::clone(&self.patterns)
    }

    /// The router, for serving it elsewhere or driving it directly.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Main proxy handler.
async fn proxy_handler<F: Forwarder>(
    State(state): State<AppState<F>>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = match dispatch(&state, request, &request_id).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                ProxyError::InvalidPath(_) => {
                    tracing::warn!(request_id = %request_id, path = %path, "Invalid path")
                }
                _ => {
                    tracing::error!(request_id = %request_id, path = %path, error = %e, "Proxy error")
                }
            }
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}

/// One request/response cycle: route, forward, rewrite.
async fn dispatch<F: Forwarder>(
    state: &AppState<F>,
    request: Request<Body>,
    request_id: &str,
) -> Result<Response, ProxyError> {
    let target = route_path(request.uri().path())?;

    tracing::debug!(
        request_id = %request_id,
        domain = %target.domain,
        path = %target.remaining_path,
        "Proxying request"
    );

    let method = request.method().clone();
    let outbound = build_outbound(request, &target)?;
    let response = state.forwarder.forward(outbound).await?;

    if !carries_body(&method, response.status()) {
        tracing::trace!(request_id = %request_id, status = %response.status(), "No body to rewrite");
        return Ok(response);
    }

    match disposition(response.headers(), &state.rewrite) {
        Disposition::Passthrough(reason) => {
            if reason != "not_html" {
                metrics::record_rewrite("skipped");
            }
            tracing::trace!(request_id = %request_id, reason, "Streaming response through");
            Ok(response)
        }
        Disposition::Rewrite => {
            let patterns = state.patterns.acquire(&target.domain)?;
            let rewritten = rewrite_response(response, &patterns, state.rewrite.max_body_bytes).await;
            state.patterns.release(patterns);
            rewritten
        }
    }
}
