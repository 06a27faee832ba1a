//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, body buffering)
//!     → request.rs (IncomingRequest: path, query, headers, JSON body)
//!     → [routing::Dispatcher picks a handler]
//!     → response.rs (HandlerResult normalized to ApiResponse)
//!     → Send to client
//!
//! GET /ws
//!     → websocket.rs (listener registered with the broadcast fan-out)
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::{IncomingRequest, UuidRequestId, X_REQUEST_ID};
pub use response::{ApiResponse, HandlerResult, Payload};
pub use server::{AppState, HttpServer};
