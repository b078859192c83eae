//! Reply serialization.
//!
//! # Responsibilities
//! - Choose status and `Content-Type` from the reply variant
//! - Encode the body bytes
//!
//! # Design Decisions
//! - Empty replies carry no `Content-Type`
//! - Error replies carry no body; the reason only goes to the log
//! - An explicit `Status` always wins over the status its inner reply
//!   implies; statuses that forbid a body (1xx, 204, 304) drop it

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};

use crate::error::SerializationError;
use crate::response::Reply;

pub const CONTENT_TYPE_TEXT: &str = "text/plain;charset=utf8";
pub const CONTENT_TYPE_JSON: &str = "application/json;charset=utf8";

/// A fully serialized response, ready for a transport adapter.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// A response with a status and nothing else.
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// The `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn with_body(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self {
            status,
            headers,
            body: Bytes::from(body),
        }
    }
}

/// Turn a reply into status, headers and body bytes.
pub fn serialize(reply: Reply) -> Result<Response, SerializationError> {
    match reply {
        Reply::Text(text) => Ok(Response::with_body(
            StatusCode::OK,
            CONTENT_TYPE_TEXT,
            text.into_bytes(),
        )),
        Reply::Json(value) => {
            let body = serde_json::to_vec(&value)?;
            Ok(Response::with_body(StatusCode::OK, CONTENT_TYPE_JSON, body))
        }
        Reply::Empty => Ok(Response::empty(StatusCode::NO_CONTENT)),
        Reply::Error(reason) => {
            tracing::debug!(reason = %reason, "Handler replied with an error");
            Ok(Response::empty(StatusCode::INTERNAL_SERVER_ERROR))
        }
        Reply::Status(status, inner) => {
            let mut response = serialize(*inner)?;
            response.status = status;
            if !allows_body(status) {
                response.body = Bytes::new();
                response.headers.remove(header::CONTENT_TYPE);
            }
            Ok(response)
        }
    }
}

fn allows_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_reply() {
        let res = serialize(Reply::Text("hi".into())).unwrap();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.text(), "hi");
        assert_eq!(res.content_type(), Some(CONTENT_TYPE_TEXT));
    }

    #[test]
    fn test_json_reply_keeps_key_order() {
        let res = serialize(Reply::Json(json!({"b": 1, "a": 2}))).unwrap();
        assert_eq!(res.text(), r#"{"b":1,"a":2}"#);
        assert_eq!(res.content_type(), Some(CONTENT_TYPE_JSON));
    }

    #[test]
    fn test_empty_reply_is_no_content() {
        let res = serialize(Reply::Empty).unwrap();
        assert_eq!(res.status, StatusCode::NO_CONTENT);
        assert!(res.body.is_empty());
        assert!(res.content_type().is_none());
    }

    #[test]
    fn test_error_reply_has_no_body() {
        let res = serialize(Reply::Error("db down".into())).unwrap();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_status_override() {
        let reply = Reply::Status(StatusCode::UNAUTHORIZED, Box::new(Reply::Text("no".into())));
        let res = serialize(reply).unwrap();
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.text(), "no");
        assert_eq!(res.content_type(), Some(CONTENT_TYPE_TEXT));
    }

    #[test]
    fn test_explicit_status_wins() {
        let reply = Reply::Status(StatusCode::NOT_FOUND, Box::new(Reply::Error("gone".into())));
        let res = serialize(reply).unwrap();
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert!(res.body.is_empty());

        let reply = Reply::Status(StatusCode::NO_CONTENT, Box::new(Reply::Text("ignored".into())));
        let res = serialize(reply).unwrap();
        assert_eq!(res.status, StatusCode::NO_CONTENT);
        assert!(res.body.is_empty());
        assert!(res.content_type().is_none());
    }
}
