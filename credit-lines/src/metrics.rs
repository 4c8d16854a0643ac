//! Prometheus metrics for the credit-lines service

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static! {
    /// Diff engine decisions
    pub static ref SHARE_DECISIONS_TOTAL: CounterVec = register_counter_vec!(
        "credit_lines_share_decisions_total",
        "Share/revoke decisions taken by the diff engine",
        &["flavor", "decision"]
    )
    .unwrap();

    /// Inbound messages by outcome
    pub static ref INBOUND_MESSAGES_TOTAL: CounterVec = register_counter_vec!(
        "credit_lines_inbound_messages_total",
        "Inbound messages by routing key and outcome",
        &["routing_key", "outcome"]
    )
    .unwrap();

    /// Event processor duration
    pub static ref PROCESSOR_DURATION: HistogramVec = register_histogram_vec!(
        "credit_lines_processor_duration_seconds",
        "Event processor duration in seconds",
        &["processor"]
    )
    .unwrap();
}
