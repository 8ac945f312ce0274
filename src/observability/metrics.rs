//! Metrics collection and exposition.
//!
//! # Metrics
//! - `web_sdk_status_transitions_total` (counter): emitted snapshots by state
//! - `web_sdk_initialized` (gauge): 1 while INITIALIZED, 0 otherwise
//! - `web_sdk_teardowns_total` (counter): teardowns by reason
//! - `web_sdk_init_failures_total` (counter): failed `init` calls by reason
//! - `web_sdk_network_wait_seconds` (histogram): time spent waiting for the
//!   user to switch networks

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_status_transition(state: &'static str, initialized: bool) {
    metrics::counter!("web_sdk_status_transitions_total", "state" => state).increment(1);
    metrics::gauge!("web_sdk_initialized").set(if initialized { 1.0 } else { 0.0 });
}

pub fn record_teardown(reason: &'static str) {
    metrics::counter!("web_sdk_teardowns_total", "reason" => reason).increment(1);
}

pub fn record_init_failure(reason: &'static str) {
    metrics::counter!("web_sdk_init_failures_total", "reason" => reason).increment(1);
}

pub fn record_network_wait(waited: Duration) {
    metrics::histogram!("web_sdk_network_wait_seconds").record(waited.as_secs_f64());
}
