//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID, retarget at https://<domain>/<path>)
//!     → upstream.rs (forward to the upstream host)
//!     → response.rs (rewrite HTML, stream everything else)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
pub use upstream::{Forwarder, HttpsForwarder};
