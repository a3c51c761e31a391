//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_admission_rejected_total` (counter): admission failures by reason
//! - `gateway_rate_limited_total` (counter): denials by namespace
//! - `gateway_rate_limit_records` (gauge): records held by the memory store
//! - `gateway_upstream_requests_total` (counter): model calls by outcome
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge, histogram, Label};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("route", route.to_string()),
        Label::new("status", status.to_string()),
    ];
    counter!("gateway_requests_total", labels.clone()).increment(1);
    histogram!("gateway_request_duration_seconds", labels).record(start.elapsed().as_secs_f64());
}

pub fn record_admission_rejected(reason: &'static str) {
    counter!("gateway_admission_rejected_total", "reason" => reason).increment(1);
}

pub fn record_rate_limited(namespace: &'static str) {
    counter!("gateway_rate_limited_total", "namespace" => namespace).increment(1);
}

pub fn record_rate_limit_records(count: usize) {
    gauge!("gateway_rate_limit_records").set(count as f64);
}

pub fn record_upstream(outcome: &'static str) {
    counter!("gateway_upstream_requests_total", "outcome" => outcome).increment(1);
}
