//! Plugin composition subsystem.
//!
//! # Data Flow
//! ```text
//! App (plugin) built with routes + hooks
//!     → composer.rs mount(parent, plugin)
//!         - seal: bind plugin's local/scoped hooks to its routes
//!         - prefix: join parent prefix onto every route path
//!         - conflict check (all-or-nothing)
//!         - copy global hooks into the parent registry
//!     → parent App (may itself be mounted further up)
//!     → compile → CompiledApp
//! ```
//!
//! # Design Decisions
//! - Mount copies: handlers and hooks are `Arc`-shared, the plugin stays usable
//! - Nested plugins are mounted before their parent, so prefixes compose
//!   by concatenation in mount order
//! - Scope is turned into concrete per-route hook lists during mount

pub mod app;
pub mod composer;

pub use app::{App, RouteOptions};
