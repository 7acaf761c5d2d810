//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_denials_total` (counter): short-circuits by guard name and status
//! - `guard_faults_total` (counter): guard errors by guard name
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder the calls are no-ops (library use, tests)
//! - The Prometheus exporter is only installed by the binary

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a pipeline short-circuit.
pub fn record_denial(guard: &str, status: u16) {
    ::metrics::counter!(
        "guard_denials_total",
        "guard" => guard.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a guard fault.
pub fn record_fault(guard: &str) {
    ::metrics::counter!("guard_faults_total", "guard" => guard.to_string()).increment(1);
}
