//! Response subsystem.
//!
//! # Data Flow
//! ```text
//! handler / hook return value
//!     → reply.rs (Responder: value → Reply)
//!     → [afterHandle hooks may replace the Reply]
//!     → serializer.rs (Reply → status, content-type, bytes)
//!     → Response handed back to the transport adapter
//! ```
//!
//! # Design Decisions
//! - `Reply` is a closed enum; the serializer matches exhaustively
//! - Strings are text, structured values are JSON, nothing is 204
//! - JSON keeps the insertion order of object keys

pub mod reply;
pub mod serializer;

pub use reply::{Json, Reply, Responder};
pub use serializer::{serialize, Response, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};
