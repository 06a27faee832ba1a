//! The forum application: dataset, API handlers, index page, static files.
//!
//! # Data Flow
//! ```text
//! Dispatcher (exclusive &mut Database)
//!     → handlers.rs (topics, posts, users, index, static catch-all)
//!     → model.rs (lookups and mutations)
//!     → index.rs / static_files.rs for non-JSON responses
//! ```

pub mod handlers;
pub mod index;
pub mod model;
pub mod static_files;

pub use handlers::register_routes;
pub use model::{Database, Post, Topic, User};
pub use static_files::StaticFiles;
