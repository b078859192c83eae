//! Error types shared across the router.
//!
//! # Taxonomy
//! - `RegistrationError`: raised while building an `App`, fatal to startup
//! - `HookError`: raised by a hook or handler, isolated to one request
//! - `SerializationError`: a reply could not be turned into bytes
//! - `BodyError`: the request body does not match its content type

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::response::Reply;

/// Errors raised while registering routes or mounting plugins.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A route already exists for this method and path.
    #[error("Route conflict: {method} {path} is already registered")]
    Conflict { method: String, path: String },
}

impl RegistrationError {
    pub(crate) fn conflict(method: Option<&Method>, path: &str) -> Self {
        Self::Conflict {
            method: method.map_or_else(|| "ALL".to_string(), Method::to_string),
            path: path.to_string(),
        }
    }
}

/// Failure raised by a hook or handler.
#[derive(Debug, Error)]
pub enum HookError {
    /// A response-like value was raised instead of returned.
    /// It becomes the response seen by `afterHandle`.
    #[error("Hook raised a response ({})", .0.status())]
    Reply(Reply),

    /// The value produced could not be serialized.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Any other failure. Answered with 500.
    #[error("Hook failed: {0}")]
    Failed(String),
}

impl HookError {
    /// Build a generic failure from anything printable.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }

    /// Raise a reply with an explicit status, e.g. `401 Unauthorized`.
    pub fn status(status: StatusCode, reply: impl Into<Reply>) -> Self {
        Self::Reply(Reply::Status(status, Box::new(reply.into())))
    }
}

/// Result type for hooks and handlers.
pub type HookResult<T> = Result<T, HookError>;

/// A value could not be encoded as a response body.
#[derive(Debug, Error)]
#[error("Serialization failed: {0}")]
pub struct SerializationError(#[from] pub serde_json::Error);

/// The request body could not be parsed according to its content type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BodyError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Body is not valid UTF-8")]
    InvalidUtf8,
}

impl From<BodyError> for HookError {
    fn from(err: BodyError) -> Self {
        HookError::status(StatusCode::BAD_REQUEST, Reply::Text(err.to_string()))
    }
}
