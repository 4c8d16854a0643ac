//! Error types for the credit-lines service

use thiserror::Error;

/// Result type for credit-lines operations
pub type Result<T> = std::result::Result<T, Error>;

/// Credit-lines errors
#[derive(Error, Debug)]
pub enum Error {
    /// A message could not be handed to the broker
    #[error("Message sending failed: {0}")]
    MessageSending(String),

    /// Inbound payload is structurally invalid
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Payload or request references something that does not hold
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Data agent (storage) failure
    #[error("Data agent error: {0}")]
    DataAgent(String),

    /// Message bus failure outside of publishing
    #[error("Message bus error: {0}")]
    Bus(#[from] message_bus::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether redelivering the same message would fail the same way
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidPayload(_) | Error::Validation(_) | Error::Serialization(_)
        )
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(Error::InvalidPayload("missing context".into()).is_validation());
        assert!(Error::Validation("wrong recipient".into()).is_validation());
        assert!(!Error::DataAgent("timeout".into()).is_validation());
        assert!(!Error::MessageSending("broker down".into()).is_validation());
        assert!(!Error::NotFound("request".into()).is_validation());
    }

    #[test]
    fn test_bus_error_conversion() {
        let err: Error = message_bus::Error::Subscribe("closed".into()).into();
        assert_eq!(err.to_string(), "Message bus error: Subscribe error: closed");
    }
}
