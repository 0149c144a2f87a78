//! Metrics collection and exposition.
//!
//! # Metrics
//! - `chainware_requests_total` (counter): requests by method and status
//! - `chainware_request_duration_seconds` (histogram): time spent in the pipeline
//! - `chainware_pipeline_errors_total` (counter): pipeline runs that failed
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus endpoint is optional and owned by the binary

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("chainware_requests_total", &labels).increment(1);
    metrics::histogram!("chainware_request_duration_seconds", &labels).record(elapsed.as_secs_f64());
}

pub fn record_pipeline_error(kind: &'static str) {
    metrics::counter!("chainware_pipeline_errors_total", "kind" => kind).increment(1);
}
