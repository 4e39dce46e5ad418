//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method, status
//! - `api_request_duration_seconds` (histogram): latency distribution
//! - `api_admission_decisions_total` (counter): allowed/denied by identity kind
//! - `api_rate_limit_entries` (gauge): identities tracked by the window store
//! - `api_rate_limit_evictions_total` (counter): windows dropped, by reason
//! - `api_validation_failures_total` (counter): rejected request payloads
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    counter!("api_requests_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    histogram!("api_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_admission(outcome: &'static str, identity_kind: &'static str) {
    counter!("api_admission_decisions_total", "outcome" => outcome, "identity" => identity_kind)
        .increment(1);
}

pub fn record_rate_limit_entries(count: usize) {
    gauge!("api_rate_limit_entries").set(count as f64);
}

pub fn record_eviction(reason: &'static str, count: usize) {
    counter!("api_rate_limit_evictions_total", "reason" => reason).increment(count as u64);
}

pub fn record_validation_failure() {
    counter!("api_validation_failures_total").increment(1);
}
