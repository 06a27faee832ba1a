//! Listener registry and snapshot fan-out.
//!
//! # Responsibilities
//! - Assign each accepted listener a unique, never reused ID
//! - Push a snapshot to every listener present at broadcast time
//! - Prune listeners whose send fails without affecting the others
//!
//! # Design Decisions
//! - Sinks are non-blocking; the socket write happens in the listener's
//!   own task, so one slow client never delays the rest
//! - Failed listeners are removed after iteration, never while the map is
//!   borrowed
//! - Listener queues are bounded. A listener that falls a full queue behind
//!   is treated as failed and pruned

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::observability::metrics;

/// Unique identifier for a connected listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Snapshots a listener may have queued before it counts as stalled.
pub const LISTENER_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Error)]
pub enum FanoutError {
    /// The receiving side of the listener has gone away.
    #[error("listener connection closed")]
    ListenerClosed,

    #[error("listener has {0} undelivered snapshots")]
    ListenerLagging(usize),
}

/// Destination for broadcast snapshots.
pub trait SnapshotSink: Send + Sync {
    fn send(&self, snapshot: Arc<str>) -> Result<(), FanoutError>;
}

impl SnapshotSink for mpsc::Sender<Arc<str>> {
    fn send(&self, snapshot: Arc<str>) -> Result<(), FanoutError> {
        self.try_send(snapshot).map_err(|e| match e {
            TrySendError::Full(_) => FanoutError::ListenerLagging(self.max_capacity()),
            TrySendError::Closed(_) => FanoutError::ListenerClosed,
        })
    }
}

/// Bounded channel feeding one listener's writer task.
pub fn listener_channel() -> (mpsc::Sender<Arc<str>>, mpsc::Receiver<Arc<str>>) {
    mpsc::channel(LISTENER_QUEUE_DEPTH)
}

/// Outcome of a single broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub pruned: Vec<ListenerId>,
}

/// The set of connected listeners.
pub struct Fanout {
    listeners: DashMap<ListenerId, Box<dyn SnapshotSink>>,
    next_id: AtomicU64,
}

impl Fanout {
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a listener and return its ID.
    pub fn accept(&self, sink: impl SnapshotSink + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, Box::new(sink));
        metrics::record_listeners(self.listeners.len());
        tracing::debug!(listener_id = %id, listeners = self.listeners.len(), "Listener accepted");
        id
    }

    /// Remove a listener. Returns whether it was present.
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            metrics::record_listeners(self.listeners.len());
            tracing::debug!(listener_id = %id, listeners = self.listeners.len(), "Listener removed");
        }
        removed
    }

    /// Send `snapshot` to every listener, pruning those that fail.
    pub fn broadcast_snapshot(&self, snapshot: &str) -> BroadcastReport {
        let shared: Arc<str> = Arc::from(snapshot);
        let mut report = BroadcastReport::default();

        for entry in self.listeners.iter() {
            match entry.value().send(shared.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(listener_id = %entry.key(), error = %e, "Snapshot delivery failed");
                    report.pruned.push(*entry.key());
                }
            }
        }

        for id in &report.pruned {
            self.remove(*id);
        }

        metrics::record_broadcast(report.delivered, report.pruned.len());
        report
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// IDs of all current listeners, in ascending order.
    pub fn listener_ids(&self) -> Vec<ListenerId> {
        let mut ids: Vec<ListenerId> = self.listeners.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Fanout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fanout")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
