//! Live forum server library.
//!
//! A JSON forum API routed by ordered regex patterns, with every request
//! that reaches a handler pushing a fresh snapshot of the dataset to all
//! connected WebSocket listeners.

// Core subsystems
pub mod broadcast;
pub mod config;
pub mod forum;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{bootstrap, Application, Shutdown};
