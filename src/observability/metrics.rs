//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vault_note_operations_total` (counter): by operation and outcome
//! - `vault_audit_write_failures_total` (counter): dropped audit records
//! - `vault_auth_failures_total` (counter): by reason
//! - `vault_rate_limit_windows` (gauge): live rate-limit windows

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_note_operation(operation: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "vault_note_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_audit_failure() {
    ::metrics::counter!("vault_audit_write_failures_total").increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    ::metrics::counter!("vault_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_rate_limit_windows(windows: usize) {
    ::metrics::gauge!("vault_rate_limit_windows").set(windows as f64);
}
