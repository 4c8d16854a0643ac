//! Error types for message bus

use thiserror::Error;

/// Message bus error
#[derive(Debug, Error)]
pub enum Error {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Publish error
    #[error("Publish error: {0}")]
    Publish(String),

    /// Subscribe error
    #[error("Subscribe error: {0}")]
    Subscribe(String),

    /// Ack, term or nak could not be delivered to the broker
    #[error("Acknowledge error: {0}")]
    Acknowledge(String),

    /// Stream creation error
    #[error("Stream creation error: {0}")]
    StreamCreation(String),

    /// Operation timed out (milliseconds)
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
