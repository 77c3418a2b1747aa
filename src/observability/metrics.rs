//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by endpoint, status
//! - `gate_request_duration_seconds` (histogram): latency by endpoint
//! - `gate_operation_timeouts_total` (counter): deadline expiries by endpoint
//! - `gate_operations_abandoned_total` (counter): operations left running after expiry
//! - `gate_audit_dropped_total` (counter): audit entries lost to a full queue

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: &'static str, status: u16, start: Instant) {
    counter!("gate_requests_total", "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
    histogram!("gate_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_timeout(endpoint: &'static str) {
    counter!("gate_operation_timeouts_total", "endpoint" => endpoint).increment(1);
}

pub fn record_abandoned_operation() {
    counter!("gate_operations_abandoned_total").increment(1);
}

pub fn record_audit_dropped() {
    counter!("gate_audit_dropped_total").increment(1);
}
