//! Path-based rewriting reverse proxy.
//!
//! `/{domain}/{path}` is forwarded to `https://{domain}/{path}`; links inside
//! HTML responses are rewritten so navigation stays on the proxy.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
