//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher / composer / http server produce:
//!     → logging.rs (structured log events, `dispatch` span per request)
//!     → metrics.rs (request counters, latency histogram, hook failures)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields, not formatted strings, for request id / stage / status
//! - Request ID flows from the transport into the dispatch span
//! - Metrics are cheap; recording with no exporter installed is a no-op

pub mod logging;
pub mod metrics;
