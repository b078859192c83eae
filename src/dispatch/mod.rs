//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! DispatchRequest (method, path, headers, body)
//!     → context.rs (RequestContext, lazy body parse)
//!     → dispatcher.rs
//!         Matching → Deriving → BeforeHandle → Handling → AfterHandle → Serializing
//!     → Response (status, headers, body)
//! ```
//!
//! # Design Decisions
//! - `CompiledApp` is immutable; share it via `Arc` across tasks
//! - Hooks of one request run strictly one after another
//! - Failures (errors and panics) stay inside the request that caused them

pub mod context;
pub mod dispatcher;

pub use context::{DispatchRequest, ParsedBody, RequestContext};
pub use dispatcher::{CompiledApp, Stage, X_REQUEST_ID};
