//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forum_requests_total` (counter): requests by method and status
//! - `forum_request_duration_seconds` (histogram): dispatch latency
//! - `forum_listeners` (gauge): connected real-time listeners
//! - `forum_broadcast_deliveries_total` (counter): snapshots handed to listeners
//! - `forum_broadcast_failures_total` (counter): listeners pruned on send failure
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed, so tests and
//!   library users pay nothing
//! - Prometheus exporter is optional and configured at startup

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("forum_requests_total", &labels).increment(1);
    histogram!("forum_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_listeners(count: usize) {
    gauge!("forum_listeners").set(count as f64);
}

pub fn record_broadcast(delivered: usize, failed: usize) {
    counter!("forum_broadcast_deliveries_total").increment(delivered as u64);
    if failed > 0 {
        counter!("forum_broadcast_failures_total").increment(failed as u64);
    }
}
