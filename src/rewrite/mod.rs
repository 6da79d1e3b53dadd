//! HTML URL rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream response (content type, body bytes)
//!     → cache.rs (acquire the PatternSet for the target domain)
//!     → engine.rs (absolute URLs → attribute URLs → CSS url())
//!     → rewritten body + new Content-Length
//!     → cache.rs (release the PatternSet)
//! ```
//!
//! # Design Decisions
//! - Regex scanning over raw bytes, not an HTML parser
//! - Pattern sets are keyed by domain and immutable once compiled
//! - Unmatched or ambiguous constructs are left untouched

pub mod cache;
pub mod engine;
pub mod patterns;

pub use cache::PatternCache;
pub use engine::{is_html, rewrite_body, rewrite_html};
pub use patterns::PatternSet;
