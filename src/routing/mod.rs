//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (build phase):
//!     App::get/post/... (path)
//!     → path.rs (join with prefix, normalize)
//!     → conflict check on (method, path)
//!
//! Compile:
//!     merged routes
//!     → router.rs (RouteTable, frozen)
//!
//! Incoming request (method, path):
//!     → path.rs (strip query, normalize)
//!     → router.rs (exact lookup)
//!     → Return: matched route or NotFound
//! ```
//!
//! # Design Decisions
//! - Prefixes are applied when a route is registered or mounted, never at match time
//! - Exact, byte-for-byte path comparison after normalization
//! - Duplicate (method, path) is a registration error, so lookups never tie
//! - Immutable after compile (thread-safe without locks)

pub mod path;
pub mod router;

pub use router::{RouteLookup, RouteTable};
