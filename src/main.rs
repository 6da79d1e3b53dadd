//! Path-based rewriting reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request  GET /example.com/about
//!     ─────────────────────────────┐
//!                                  ▼
//!     ┌──────────┐    ┌──────────────┐    ┌───────────┐
//!     │ routing  │───▶│ http request │───▶│ upstream  │────▶ https://example.com/about
//!     │ (domain) │    │  (retarget)  │    │ forwarder │
//!     └──────────┘    └──────────────┘    └─────┬─────┘
//!                                               │
//!     Client Response                           ▼
//!     ◀────────────── ┌──────────────┐    ┌───────────┐
//!                     │ http response│◀───│  rewrite  │◀─── pattern cache
//!                     │ (re-frame)   │    │  engine   │     (per domain)
//!                     └──────────────┘    └───────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use path_proxy::config::{load_config, ProxyConfig};
use path_proxy::lifecycle::{signals, Shutdown};
use path_proxy::observability::{logging, metrics};
use path_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "path-proxy", version, about = "Path-based rewriting reverse proxy")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = args.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        rewrite_enabled = config.rewrite.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Server running");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(config).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
