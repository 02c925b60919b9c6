//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by route, status
//! - `relay_request_duration_seconds` (histogram): time to response headers
//! - `relay_upstream_failures_total` (counter): request-phase failures by kind
//! - `relay_sessions_active` (gauge): relay sessions holding an origin connection
//! - `relay_bytes_total` (counter): body bytes handed to clients

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record a finished request (headers sent).
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!("relay_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request-phase failure against an origin.
pub fn record_upstream_failure(kind: &'static str) {
    metrics::counter!("relay_upstream_failures_total", "kind" => kind).increment(1);
}

pub fn relay_opened() {
    metrics::gauge!("relay_sessions_active").increment(1.0);
}

pub fn relay_closed() {
    metrics::gauge!("relay_sessions_active").decrement(1.0);
}

pub fn relay_bytes(len: usize) {
    metrics::counter!("relay_bytes_total").increment(len as u64);
}
