//! Metrics collection and exposition.
//!
//! # Metrics
//! - `studio_throttle_rejected_total` (counter): requests refused by a throttle, by policy
//! - `studio_login_attempts_total` (counter): login attempts by outcome
//! - `studio_lockouts_total` (counter): clients locked out after repeated failures
//! - `studio_uploads_total` / `studio_upload_bytes_total` (counters): by upload kind
//! - `studio_security_events_total` (counter): security monitor events by kind
//! - `studio_active_sessions` (gauge): live admin sessions
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use ::metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_throttle_rejected(policy: &'static str) {
    counter!("studio_throttle_rejected_total", "policy" => policy).increment(1);
}

pub fn record_login_attempt(outcome: &'static str) {
    counter!("studio_login_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_lockout() {
    counter!("studio_lockouts_total").increment(1);
}

pub fn record_upload(kind: &'static str, bytes: u64) {
    counter!("studio_uploads_total", "kind" => kind).increment(1);
    counter!("studio_upload_bytes_total", "kind" => kind).increment(bytes);
}

pub fn record_security_event(kind: &'static str) {
    counter!("studio_security_events_total", "kind" => kind).increment(1);
}

pub fn record_active_sessions(count: usize) {
    gauge!("studio_active_sessions").set(count as f64);
}
