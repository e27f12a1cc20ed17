//! Metrics collection.
//!
//! # Metrics
//! - `hive_rpc_requests_total` (counter): attempts by method, node, outcome
//! - `hive_rpc_request_duration_seconds` (histogram): attempt latency by method
//! - `hive_rpc_retries_total` (counter): scheduled retries by method
//! - `hive_node_available` (gauge): 1=selectable, 0=skipped
//! - `hive_broadcast_total` (counter): broadcasts by mode, outcome

use std::time::Instant;

/// Outcome label for a single RPC attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Rejected,
    TransportError,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Rejected => "rejected",
            CallOutcome::TransportError => "transport_error",
        }
    }
}

pub fn record_rpc_request(method: &str, node: &str, outcome: CallOutcome, start: Instant) {
    ::metrics::counter!(
        "hive_rpc_requests_total",
        "method" => method.to_string(),
        "node" => node.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    ::metrics::histogram!("hive_rpc_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rpc_retry(method: &str) {
    ::metrics::counter!("hive_rpc_retries_total", "method" => method.to_string()).increment(1);
}

pub fn record_node_available(node: &str, available: bool) {
    ::metrics::gauge!("hive_node_available", "node" => node.to_string())
        .set(if available { 1.0 } else { 0.0 });
}

pub fn record_broadcast(mode: &'static str, outcome: &'static str) {
    ::metrics::counter!("hive_broadcast_total", "mode" => mode, "outcome" => outcome).increment(1);
}
