//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method and status
//! - `api_request_duration_seconds` (histogram): latency distribution

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(error = %e, "Failed to install Prometheus exporter");
    } else {
        tracing::info!(address = %addr, "Metrics endpoint started");
    }
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, started: Instant) {
    metrics::counter!(
        "api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!(
        "api_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .record(started.elapsed().as_secs_f64());
}
