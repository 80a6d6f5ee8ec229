//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_rejected_total` (counter): inbound requests denied admission, by route template
//! - `gateway_upstream_calls_total` (counter): upstream calls by operation, outcome
//! - `gateway_upstream_call_duration_seconds` (histogram): upstream latency by operation
//! - `gateway_upstream_retries_total` (counter): retry attempts by operation

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// `route` must be a route template (bounded set), not a request path.
pub fn record_rate_limited(route: &str) {
    counter!("gateway_requests_rejected_total", "route" => route.to_string()).increment(1);
}

pub fn record_upstream_call(operation: &'static str, outcome: &'static str, start: Instant) {
    counter!(
        "gateway_upstream_calls_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    histogram!("gateway_upstream_call_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(operation: &'static str) {
    counter!("gateway_upstream_retries_total", "operation" => operation).increment(1);
}
