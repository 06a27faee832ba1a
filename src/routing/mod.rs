//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! IncomingRequest (method, path, body)
//!     → router.rs (first route whose method and pattern match)
//!     → matcher.rs (anchored regex, positional captures)
//!     → dispatcher.rs (parse body, check required fields, run handler)
//!     → ApiResponse + MutationNotifier::notify()
//!
//! Route Registration (at startup):
//!     register(method, pattern, handler, required_fields)
//!     → compile pattern
//!     → append to table (order = priority)
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - First match wins, in registration order
//! - Explicit no-match error rather than a silent default

pub mod dispatcher;
pub mod matcher;
pub mod router;

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::http::response::ApiResponse;

pub use dispatcher::{Dispatch, Dispatcher, MutationNotifier};
pub use matcher::CompiledPattern;
pub use router::{
    required_fields, Handler, HandlerContext, RequiredField, Route, RouteInfo, RouteTable,
};

/// Errors raised while building a route table.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Reasons a request is rejected before reaching a handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No matching route")]
    NoRouteMatched { method: Method, path: String },

    #[error("Request body is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("Missing required field '{field}': {description}")]
    MissingRequiredField { field: String, description: String },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoRouteMatched { .. } => StatusCode::NOT_FOUND,
            Self::InvalidBody(_) | Self::MissingRequiredField { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<DispatchError> for ApiResponse {
    fn from(error: DispatchError) -> Self {
        ApiResponse::error(error.status(), error.to_string())
    }
}
