//! Resilience subsystem.
//!
//! # Design Decisions
//! - Clients reconnect forever; only the delay between attempts changes

pub mod backoff;

pub use backoff::ReconnectBackoff;
