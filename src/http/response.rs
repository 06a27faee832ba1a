//! Handler results and response normalization.
//!
//! # Responsibilities
//! - Model what a handler may return (bare value or structured triple)
//! - Normalize missing status / content type to 200 / JSON
//! - Serialize the body according to its content type
//!
//! # Design Decisions
//! - JSON payloads are encoded unless a text content type is declared and
//!   the value is a plain string, which is then written raw (HTML pages)
//! - 204 responses never carry a body
//! - Error bodies always have the shape `{ "error": "<message>" }`

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Value};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Body produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

/// Value returned by a route handler.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    /// A bare JSON value, sent as 200 `application/json`.
    Plain(Value),
    /// A body with optional status and content type.
    Structured {
        body: Payload,
        status: Option<StatusCode>,
        content_type: Option<String>,
    },
}

impl HandlerResult {
    /// Serialize any value into a bare 200 result.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self::Plain(value),
            Err(e) => {
                tracing::error!(error = %e, "Handler result is not JSON-serializable");
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Response serialization failed")
            }
        }
    }

    /// Serialize a value with an explicit status.
    pub fn with_status<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match Self::json(value) {
            Self::Plain(value) => Self::Structured {
                body: Payload::Json(value),
                status: Some(status),
                content_type: None,
            },
            error => error,
        }
    }

    /// A handler-authored error object.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Structured {
            body: Payload::Json(json!({ "error": message.into() })),
            status: Some(status),
            content_type: None,
        }
    }

    pub fn html(page: impl Into<String>) -> Self {
        Self::Structured {
            body: Payload::Text(page.into()),
            status: None,
            content_type: Some(HTML_CONTENT_TYPE.to_string()),
        }
    }

    /// An empty body with the given status.
    pub fn empty(status: StatusCode) -> Self {
        Self::Structured {
            body: Payload::Text(String::new()),
            status: Some(status),
            content_type: Some("text/plain".to_string()),
        }
    }

    pub fn file(contents: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self::Structured {
            body: Payload::Binary(contents.into()),
            status: None,
            content_type: Some(content_type.into()),
        }
    }
}

impl From<Value> for HandlerResult {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

/// A normalized response ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Bytes,
}

impl ApiResponse {
    /// A JSON error object response.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        HandlerResult::error(status, message).into()
    }

    /// Decode the body as JSON, if it is JSON.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    pub fn text_body(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(JSON_CONTENT_TYPE) || essence.ends_with("+json")
}

fn encode(payload: Payload, content_type: &str) -> Bytes {
    match payload {
        Payload::Json(Value::String(text)) if !is_json_content_type(content_type) => {
            Bytes::from(text)
        }
        // Serializing a `Value` cannot fail.
        Payload::Json(value) => Bytes::from(value.to_string()),
        Payload::Text(text) => Bytes::from(text),
        Payload::Binary(bytes) => bytes,
    }
}

impl From<HandlerResult> for ApiResponse {
    fn from(result: HandlerResult) -> Self {
        let (body, status, content_type) = match result {
            HandlerResult::Plain(value) => (Payload::Json(value), None, None),
            HandlerResult::Structured {
                body,
                status,
                content_type,
            } => (body, status, content_type),
        };

        let status = status.unwrap_or(StatusCode::OK);
        let content_type = content_type.unwrap_or_else(|| JSON_CONTENT_TYPE.to_string());
        let body = if status == StatusCode::NO_CONTENT {
            Bytes::new()
        } else {
            encode(body, &content_type)
        };

        Self {
            status,
            content_type,
            body,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if let Ok(value) = HeaderValue::from_str(&self.content_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value_normalizes_to_json_200() {
        let response = ApiResponse::from(HandlerResult::Plain(json!({"id": "42"})));
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type, JSON_CONTENT_TYPE);
        assert_eq!(response.json_body(), Some(json!({"id": "42"})));
    }

    #[test]
    fn test_structured_fills_missing_fields() {
        let response = ApiResponse::from(HandlerResult::Structured {
            body: Payload::Json(json!([1, 2])),
            status: None,
            content_type: None,
        });
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type, JSON_CONTENT_TYPE);
        assert_eq!(response.text_body(), "[1,2]");
    }

    #[test]
    fn test_html_string_is_written_raw() {
        let response = ApiResponse::from(HandlerResult::Structured {
            body: Payload::Json(json!("<h1>hi</h1>")),
            status: None,
            content_type: Some(HTML_CONTENT_TYPE.into()),
        });
        assert_eq!(response.text_body(), "<h1>hi</h1>");
    }

    #[test]
    fn test_json_string_is_quoted() {
        let response = ApiResponse::from(HandlerResult::with_status(
            StatusCode::NOT_FOUND,
            &"No matching route or file",
        ));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.text_body(), "\"No matching route or file\"");
    }

    #[test]
    fn test_no_content_drops_body() {
        let response = ApiResponse::from(HandlerResult::with_status(StatusCode::NO_CONTENT, &""));
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_error_has_error_object_shape() {
        let response = ApiResponse::error(StatusCode::BAD_REQUEST, "bad");
        assert_eq!(response.json_body(), Some(json!({"error": "bad"})));
    }

    #[test]
    fn test_vendor_json_types_are_encoded() {
        assert!(is_json_content_type("application/problem+json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(!is_json_content_type("text/html"));
    }
}
