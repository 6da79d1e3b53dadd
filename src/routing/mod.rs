//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (raw path)
//!     → router.rs (split first segment off the path)
//!     → Return: ProxyTarget { domain, remaining_path } or InvalidPath
//! ```
//!
//! # Design Decisions
//! - The first path segment *is* the upstream host; there is no route table
//! - No decoding or hostname validation: the segment is passed through verbatim
//! - Deterministic and allocation-light: one split, one join

pub mod router;

pub use router::{route_path, ProxyTarget};
