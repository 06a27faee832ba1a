//! Real-time broadcast subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher finishes a handler
//!     → SnapshotNotifier::notify()
//!     → snapshot.rs (pretty JSON → HTML escape → highlight spans)
//!     → fanout.rs (push to every listener, prune failures)
//!     → http::websocket writer tasks (text frames to browsers)
//! ```
//!
//! # Design Decisions
//! - The fan-out knows nothing about state; it only moves strings
//! - The notifier re-reads state under the same mutex handlers use, so a
//!   snapshot never shows a half-applied mutation

pub mod fanout;
pub mod snapshot;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::routing::MutationNotifier;

pub use fanout::{
    listener_channel, BroadcastReport, Fanout, FanoutError, ListenerId, SnapshotSink,
    LISTENER_QUEUE_DEPTH,
};
pub use snapshot::{render_highlighted, strip_highlighting};

/// Mutation notifier that pushes a highlighted snapshot of `S` to every
/// listener of a [`Fanout`].
pub struct SnapshotNotifier<S> {
    state: Arc<Mutex<S>>,
    fanout: Arc<Fanout>,
}

impl<S: Serialize> SnapshotNotifier<S> {
    pub fn new(state: Arc<Mutex<S>>, fanout: Arc<Fanout>) -> Self {
        Self { state, fanout }
    }

    /// Render the current state and broadcast it.
    pub fn publish(&self) -> Option<BroadcastReport> {
        if self.fanout.is_empty() {
            return None;
        }

        let rendered = {
            let state = self
                .state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            render_highlighted(&*state)
        };

        match rendered {
            Ok(snapshot) => Some(self.fanout.broadcast_snapshot(&snapshot)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize state snapshot");
                None
            }
        }
    }
}

impl<S: Serialize + Send> MutationNotifier for SnapshotNotifier<S> {
    fn notify(&self) {
        if let Some(report) = self.publish() {
            tracing::debug!(
                delivered = report.delivered,
                pruned = report.pruned.len(),
                "State snapshot broadcast"
            );
        }
    }
}
