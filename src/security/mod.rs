//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → tower_http RequestBodyLimitLayer (reject oversized bodies)
//!     → handler
//!     → headers.rs (hardening headers on the way out)
//! ```

pub mod headers;

pub use headers::nosniff_layer;
