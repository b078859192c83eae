//! Per-request state.
//!
//! # Responsibilities
//! - Carry method, path, query, headers and body through the pipeline
//! - Parse the body lazily, once, according to its content type
//! - Accumulate values produced by `derive` hooks
//! - Expose the current response to `afterHandle` hooks
//!
//! # Design Decisions
//! - The request itself is shared behind an `Arc`; hooks get cheap clones
//! - Derived values are copy-on-write, so a clone never sees later changes

use std::sync::{Arc, OnceLock};

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{BodyError, HookResult};
use crate::hooks::Derived;
use crate::response::{Reply, Responder};
use crate::routing::path;

/// What the dispatcher receives from a transport adapter.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub method: Method,
    /// Request target; may include a query string.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl DispatchRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and its content type.
    #[must_use]
    pub fn json(self, value: &Value) -> Self {
        self.header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(value.to_string())
    }
}

/// The request body, interpreted by content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Empty,
    Json(Value),
    Text(String),
    Bytes(Bytes),
}

impl Responder for ParsedBody {
    fn into_reply(self) -> HookResult<Reply> {
        Ok(match self {
            ParsedBody::Empty => Reply::Empty,
            ParsedBody::Json(value) => Reply::Json(value),
            ParsedBody::Text(text) => Reply::Text(text),
            ParsedBody::Bytes(bytes) => Reply::Text(String::from_utf8_lossy(&bytes).into_owned()),
        })
    }
}

#[derive(Debug)]
struct RequestParts {
    request_id: String,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    parsed: OnceLock<Result<ParsedBody, BodyError>>,
}

/// State of one request as seen by hooks and handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    parts: Arc<RequestParts>,
    derived: Arc<Map<String, Value>>,
    response: Option<Reply>,
}

impl RequestContext {
    pub(crate) fn new(request: DispatchRequest, request_id: String) -> Self {
        let query = request
            .path
            .split_once('?')
            .map(|(_, q)| q.split('#').next().unwrap_or_default().to_string());

        Self {
            parts: Arc::new(RequestParts {
                request_id,
                method: request.method,
                path: path::normalize(&request.path),
                query,
                headers: request.headers,
                body: request.body,
                parsed: OnceLock::new(),
            }),
            derived: Arc::new(Map::new()),
            response: None,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.parts.request_id
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Normalized request path, without query string.
    pub fn path(&self) -> &str {
        &self.parts.path
    }

    /// Raw query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.parts.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// A cookie from the `Cookie` header(s).
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// The unparsed body bytes.
    pub fn raw_body(&self) -> &Bytes {
        &self.parts.body
    }

    /// The parsed body. Parsed on first access; later calls reuse the result.
    pub fn body(&self) -> Result<&ParsedBody, BodyError> {
        self.parts
            .parsed
            .get_or_init(|| parse_body(&self.parts.headers, &self.parts.body))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Deserialize a JSON body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        match self.body()? {
            ParsedBody::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| BodyError::InvalidJson(e.to_string())),
            _ => Err(BodyError::InvalidJson("expected a JSON body".to_string())),
        }
    }

    /// A value added by a `derive` hook.
    pub fn derived(&self, key: &str) -> Option<&Value> {
        self.derived.get(key)
    }

    /// The response so far. Set while `afterHandle` hooks run.
    pub fn response(&self) -> Option<&Reply> {
        self.response.as_ref()
    }

    pub(crate) fn merge_derived(&mut self, derived: Derived) {
        let values = derived.into_inner();
        if !values.is_empty() {
            Arc::make_mut(&mut self.derived).extend(values);
        }
    }

    pub(crate) fn set_response(&mut self, reply: Reply) {
        self.response = Some(reply);
    }

    pub(crate) fn take_response(&mut self) -> Option<Reply> {
        self.response.take()
    }
}

fn parse_body(headers: &HeaderMap, body: &Bytes) -> Result<ParsedBody, BodyError> {
    if body.is_empty() {
        return Ok(ParsedBody::Empty);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase());

    match content_type.as_deref() {
        Some(ct) if ct == "application/json" || ct.ends_with("+json") => {
            serde_json::from_slice(body)
                .map(ParsedBody::Json)
                .map_err(|e| BodyError::InvalidJson(e.to_string()))
        }
        Some(ct) if ct.starts_with("text/") => std::str::from_utf8(body)
            .map(|text| ParsedBody::Text(text.to_string()))
            .map_err(|_| BodyError::InvalidUtf8),
        Some(_) => Ok(ParsedBody::Bytes(body.clone())),
        None => Ok(std::str::from_utf8(body)
            .map(|text| ParsedBody::Text(text.to_string()))
            .unwrap_or_else(|_| ParsedBody::Bytes(body.clone()))),
    }
}
