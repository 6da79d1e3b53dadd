//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency by method
//! - `proxy_rewrites_total` (counter): HTML bodies by outcome
//! - `proxy_rewrite_bytes_total` (counter): bytes into and out of the engine
//! - `proxy_pattern_cache_total` (counter): pattern cache hits and misses
//! - `proxy_pattern_cache_entries` (gauge): cached domains

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record what happened to an upstream response body.
pub fn record_rewrite(outcome: &'static str) {
    counter!("proxy_rewrites_total", "outcome" => outcome).increment(1);
}

/// Record bytes before and after rewriting.
pub fn record_rewrite_bytes(bytes_in: usize, bytes_out: usize) {
    counter!("proxy_rewrite_bytes_total", "direction" => "in").increment(bytes_in as u64);
    counter!("proxy_rewrite_bytes_total", "direction" => "out").increment(bytes_out as u64);
}

/// Record a pattern cache lookup (`hit` or `miss`).
pub fn record_pattern_cache(result: &'static str) {
    counter!("proxy_pattern_cache_total", "result" => result).increment(1);
}

pub fn record_pattern_cache_size(entries: usize) {
    gauge!("proxy_pattern_cache_entries").set(entries as f64);
}
