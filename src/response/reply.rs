//! Handler return values.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::error::{HookError, HookResult, SerializationError};

/// The value a handler or hook produced, before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Sent as `text/plain;charset=utf8`.
    Text(String),
    /// Sent as `application/json;charset=utf8`.
    Json(Value),
    /// No content. Answered with 204.
    Empty,
    /// The handler reported an error. Answered with 500 and no body.
    Error(String),
    /// Another reply sent with an explicit status code. The code replaces
    /// whatever status the inner reply implies.
    Status(StatusCode, Box<Reply>),
}

impl Reply {
    /// Encode any serializable value as a JSON reply.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, SerializationError> {
        Ok(Reply::Json(serde_json::to_value(value)?))
    }

    /// The status this reply will be sent with.
    pub fn status(&self) -> StatusCode {
        match self {
            Reply::Text(_) | Reply::Json(_) => StatusCode::OK,
            Reply::Empty => StatusCode::NO_CONTENT,
            Reply::Error(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Reply::Status(status, _) => *status,
        }
    }

    /// True for `Empty`, the "no value returned" marker.
    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Empty)
    }
}

impl From<&str> for Reply {
    fn from(value: &str) -> Self {
        Reply::Text(value.to_string())
    }
}

impl From<String> for Reply {
    fn from(value: String) -> Self {
        Reply::Text(value)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Empty
    }
}

/// Wrapper marking a serializable value as a JSON reply.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

/// Conversion from a handler's return type into a `Reply`.
///
/// `beforeHandle` and `afterHandle` hooks use the same trait; for them
/// `Reply::Empty` means "no value returned" and the pipeline carries on.
pub trait Responder: Send + 'static {
    fn into_reply(self) -> HookResult<Reply>;
}

impl Responder for Reply {
    fn into_reply(self) -> HookResult<Reply> {
        Ok(self)
    }
}

impl Responder for () {
    fn into_reply(self) -> HookResult<Reply> {
        Ok(Reply::Empty)
    }
}

impl Responder for &'static str {
    fn into_reply(self) -> HookResult<Reply> {
        Ok(Reply::Text(self.to_string()))
    }
}

impl Responder for String {
    fn into_reply(self) -> HookResult<Reply> {
        Ok(Reply::Text(self))
    }
}

impl Responder for Value {
    fn into_reply(self) -> HookResult<Reply> {
        Ok(Reply::Json(self))
    }
}

impl Responder for StatusCode {
    fn into_reply(self) -> HookResult<Reply> {
        Ok(Reply::Status(self, Box::new(Reply::Empty)))
    }
}

impl<T: Serialize + Send + 'static> Responder for Json<T> {
    fn into_reply(self) -> HookResult<Reply> {
        Ok(Reply::json(&self.0)?)
    }
}

impl<T: Responder> Responder for Option<T> {
    fn into_reply(self) -> HookResult<Reply> {
        self.map_or(Ok(Reply::Empty), Responder::into_reply)
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn into_reply(self) -> HookResult<Reply> {
        let (status, inner) = self;
        Ok(Reply::Status(status, Box::new(inner.into_reply()?)))
    }
}

impl<T, E> Responder for Result<T, E>
where
    T: Responder,
    E: Into<HookError> + Send + 'static,
{
    fn into_reply(self) -> HookResult<Reply> {
        self.map_err(Into::into)?.into_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_string_and_object_replies() {
        assert_eq!("hi".into_reply().unwrap(), Reply::Text("hi".into()));
        assert_eq!(
            json!({"a": 1}).into_reply().unwrap(),
            Reply::Json(json!({"a": 1}))
        );
        assert_eq!(().into_reply().unwrap(), Reply::Empty);
        assert_eq!(None::<String>.into_reply().unwrap(), Reply::Empty);
    }

    #[test]
    fn test_json_wrapper_serializes_struct() {
        #[derive(Serialize)]
        struct Greeting {
            message: &'static str,
        }

        let reply = Json(Greeting { message: "Yugiri" }).into_reply().unwrap();
        assert_eq!(reply, Reply::Json(json!({"message": "Yugiri"})));
    }

    #[test]
    fn test_unserializable_value_fails() {
        // JSON object keys must be strings.
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);

        match Json(map).into_reply() {
            Err(HookError::Serialization(_)) => {}
            other => panic!("expected serialization error, got {other:?}"),
        }
    }

    #[test]
    fn test_status_tuple() {
        let reply = (StatusCode::CREATED, "made").into_reply().unwrap();
        assert_eq!(reply.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_result_error_propagates() {
        let result: Result<String, HookError> = Err(HookError::failed("boom"));
        assert!(matches!(result.into_reply(), Err(HookError::Failed(_))));
    }
}
