//! Metrics collection and exposition.
//!
//! # Metrics
//! - `admission_requests_total` (counter): requests by method, status
//! - `admission_request_duration_seconds` (histogram): latency distribution
//! - `admission_rejections_total` (counter): guard refusals by reason
//! - `admission_outbound_fetch_total` (counter): outbound fetches by outcome
//! - `admission_tasks_total` (counter): task transitions by status
//! - `admission_rate_limited_total` (counter): 429 responses
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests and
//!   deployments without `metrics_enabled` pay nothing
//! - Labels are fixed tag strings, never request data

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::guard::RejectionReason;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "admission_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("admission_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: RejectionReason) {
    metrics::counter!("admission_rejections_total", "reason" => reason.as_str()).increment(1);
}

pub fn record_fetch(outcome: &'static str) {
    metrics::counter!("admission_outbound_fetch_total", "outcome" => outcome).increment(1);
}

pub fn record_task(status: &'static str) {
    metrics::counter!("admission_tasks_total", "status" => status).increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!("admission_rate_limited_total").increment(1);
}
