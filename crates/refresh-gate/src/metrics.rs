//! Gate metrics
//!
//! Emits through the `metrics` facade only — installing a recorder and
//! exposing it is the hosting application's job. Without a recorder
//! every call here is a no-op.
//!
//! - `gate_requests_total` (counter): labels `method`, `outcome`
//! - `gate_renewals_total` (counter): label `outcome`
//! - `gate_waiters_flushed_total` (counter)
//! - `gate_sessions_lost_total` (counter)

/// Record a dispatched request with its final outcome
/// (`ok`, `error`, or `session_lost`).
pub fn record_request(method: &reqwest::Method, outcome: &'static str) {
    metrics::counter!(
        "gate_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome,
    )
    .increment(1);
}

/// Record one renewal attempt (`success` or `failure`).
pub fn record_renewal(outcome: &'static str) {
    metrics::counter!("gate_renewals_total", "outcome" => outcome).increment(1);
}

/// Record the number of waiters flushed by a completed refresh cycle.
pub fn record_waiters_flushed(count: usize) {
    metrics::counter!("gate_waiters_flushed_total").increment(count as u64);
}

/// Record one irrecoverable session loss.
pub fn record_session_lost() {
    metrics::counter!("gate_sessions_lost_total").increment(1);
}
