//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Capture method, path, query, headers and the buffered body
//! - Lenient JSON parsing of the body for handlers
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body size limits are enforced by middleware before buffering
//! - Route matching sees the path only; the query string is kept aside

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// A fully buffered request as seen by route handlers.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub raw_body: Bytes,
    /// Parsed body; `None` when the body was empty or not valid JSON.
    pub json: Option<Value>,
}

impl IncomingRequest {
    /// Build a request from a method and a path with optional query string.
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (url.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            raw_body: Bytes::new(),
            json: None,
        }
    }

    /// Build a request from axum request parts and an already buffered body.
    pub fn from_parts(parts: &Parts, raw_body: Bytes) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            raw_body,
            json: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.raw_body = body.into();
        self
    }

    /// Set the raw body to the JSON encoding of `value`.
    pub fn with_json(self, value: &Value) -> Self {
        let body = value.to_string();
        self.with_body(body)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Path plus query string, as the client sent it.
    pub fn url(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// The correlation ID assigned by the request-id middleware, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }

    pub fn has_body(&self) -> bool {
        !self.raw_body.iter().all(u8::is_ascii_whitespace)
    }

    /// A top-level field of the parsed JSON body.
    pub fn json_field(&self, name: &str) -> Option<&Value> {
        self.json.as_ref().and_then(|json| json.get(name))
    }

    /// A top-level field rendered as text. Strings are returned as-is,
    /// other JSON values as their JSON encoding.
    pub fn json_text(&self, name: &str) -> Option<String> {
        self.json_field(name).map(value_to_text)
    }

    /// Parse the raw body into `json`. Leaves `json` as `None` on failure.
    pub(crate) fn parse_json(&mut self) -> Result<(), serde_json::Error> {
        self.json = None;
        if !self.has_body() {
            return Ok(());
        }
        self.json = Some(serde_json::from_slice(&self.raw_body)?);
        Ok(())
    }
}

/// Render a JSON value as plain text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_splits_path_and_query() {
        let req = IncomingRequest::new(Method::GET, "/api/topics?sort=asc");
        assert_eq!(req.path, "/api/topics");
        assert_eq!(req.query.as_deref(), Some("sort=asc"));
        assert_eq!(req.url(), "/api/topics?sort=asc");
    }

    #[test]
    fn test_parses_json_body() {
        let mut req =
            IncomingRequest::new(Method::POST, "/api/topics").with_json(&json!({"user": "alfred"}));
        req.parse_json().unwrap();
        assert_eq!(req.json_text("user").as_deref(), Some("alfred"));
    }

    #[test]
    fn test_empty_body_parses_to_none() {
        let mut req = IncomingRequest::new(Method::POST, "/").with_body("  \n");
        assert!(!req.has_body());
        req.parse_json().unwrap();
        assert!(req.json.is_none());
    }

    #[test]
    fn test_invalid_body_leaves_json_unset() {
        let mut req = IncomingRequest::new(Method::POST, "/").with_body("{nope");
        assert!(req.parse_json().is_err());
        assert!(req.json.is_none());
    }

    #[test]
    fn test_non_string_values_render_as_json_text() {
        assert_eq!(value_to_text(&json!(12)), "12");
        assert_eq!(value_to_text(&json!("plain")), "plain");
        assert_eq!(value_to_text(&json!(null)), "null");
    }

    #[test]
    fn test_request_id_reads_correlation_header() {
        let req = IncomingRequest::new(Method::GET, "/api/users")
            .with_header(X_REQUEST_ID, HeaderValue::from_static("req-42"));
        assert_eq!(req.request_id(), Some("req-42"));
        assert_eq!(IncomingRequest::new(Method::GET, "/").request_id(), None);
    }

    #[test]
    fn test_uuid_request_ids_are_unique() {
        let req = Request::builder().body(()).unwrap();
        let mut maker = UuidRequestId;
        let a = maker.make_request_id(&req).unwrap();
        let b = maker.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
