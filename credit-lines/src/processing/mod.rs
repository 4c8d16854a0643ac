//! Inbound message processing
//!
//! Messages consumed from other companies are routed to the first
//! [`EventProcessor`] whose predicate accepts them. A processor reports a
//! [`ProcessingOutcome`], which the dispatcher turns into exactly one
//! settlement of the delivery.

pub mod credit_line;
pub mod deposit_loan;
pub mod registry;
pub mod service;

pub use credit_line::{
    CreditLineRequestDeclinedProcessor, CreditLineRequestProcessor, RevokeCreditLineProcessor,
    ShareCreditLineProcessor,
};
pub use deposit_loan::{
    DepositLoanRequestDeclinedProcessor, DepositLoanRequestProcessor, RevokeDepositLoanProcessor,
    ShareDepositLoanProcessor,
};
pub use registry::{default_processors, ProcessorRegistry};
pub use service::{ConsumerState, MessageProcessorService};

use crate::{
    messages::MessageType,
    models::FeatureType,
    Error, Result,
};
use async_trait::async_trait;
use message_bus::Disposition;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Delivered message with its envelope fields peeked
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub routing_key: String,
    pub message_type: Option<MessageType>,
    pub feature_type: Option<FeatureType>,
    pub content: Value,
}

impl InboundMessage {
    /// Unknown or missing envelope fields parse to `None`
    pub fn parse(routing_key: impl Into<String>, content: Value) -> Self {
        let message_type = content
            .get("messageType")
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        let feature_type = content
            .get("featureType")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        Self {
            routing_key: routing_key.into(),
            message_type,
            feature_type,
            content,
        }
    }

    /// Whether the envelope carries `message_type` and one of `features`
    pub fn is(&self, message_type: MessageType, features: &[FeatureType]) -> bool {
        self.message_type == Some(message_type)
            && self.feature_type.map_or(false, |f| features.contains(&f))
    }

    /// Decode the whole message into its typed form
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.content.clone())
            .map_err(|e| Error::InvalidPayload(format!("{}: {}", self.routing_key, e)))
    }
}

/// How processing a message ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Done; `true` when a domain write happened
    Processed(bool),
    /// Will never succeed; drop it
    Rejected(String),
    /// May succeed on redelivery
    Retryable(String),
}

impl ProcessingOutcome {
    pub fn from_result(result: Result<bool>) -> Self {
        match result {
            Ok(written) => ProcessingOutcome::Processed(written),
            Err(e) if e.is_validation() => ProcessingOutcome::Rejected(e.to_string()),
            Err(e) => ProcessingOutcome::Retryable(e.to_string()),
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            ProcessingOutcome::Processed(_) => Disposition::Ack,
            ProcessingOutcome::Rejected(_) => Disposition::Reject,
            ProcessingOutcome::Retryable(_) => Disposition::Requeue,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingOutcome::Processed(_) => "processed",
            ProcessingOutcome::Rejected(_) => "rejected",
            ProcessingOutcome::Retryable(_) => "retryable",
        }
    }
}

/// Adapter from one kind of inbound message to a domain command
#[async_trait]
pub trait EventProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Predicates of registered processors must not overlap
    fn should_process(&self, message: &InboundMessage) -> bool;

    async fn process_message(&self, message: &InboundMessage) -> ProcessingOutcome;
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidPayload(format!("{} is empty", field)));
    }
    Ok(())
}

pub(crate) fn require_recipient(company_static_id: &str, recepient_static_id: &str) -> Result<()> {
    if company_static_id != recepient_static_id {
        return Err(Error::Validation(format!(
            "Message addressed to {} received by {}",
            recepient_static_id, company_static_id
        )));
    }
    Ok(())
}
