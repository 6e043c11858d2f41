//! Metrics definitions for the SSO gate.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sso_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by code:
//! - `outcome`: gate outcome names (see [`crate::gate::Decision::outcome`])
//! - `operation`: `ticket_exchange`, `fetch_roles`
//! - `status`: `success`, `rejected`, `error`

use metrics::{counter, histogram};
use std::time::Duration;

/// Record the decision the gate reached for one request.
///
/// Metric: `sso_gate_decisions_total`
/// Labels: `outcome`
pub fn record_gate_decision(outcome: &'static str) {
    counter!("sso_gate_decisions_total", "outcome" => outcome).increment(1);
}

/// Record one identity server call.
///
/// Metric: `sso_upstream_requests_total`, `sso_upstream_request_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_upstream_request(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!("sso_upstream_request_duration_seconds",
        "operation" => operation
    )
    .record(duration.as_secs_f64());

    counter!("sso_upstream_requests_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}
