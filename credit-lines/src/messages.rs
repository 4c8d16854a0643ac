//! Wire messages exchanged with other companies

use crate::models::{
    CreditLineDisclosure, DepositLoanContext, DepositLoanDisclosure, FeatureType, ProductContext,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current envelope version
pub const MESSAGE_VERSION: u32 = 1;

/// Closed set of message types; the wire names double as routing keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "KOMGO.CreditLines.Share")]
    Share,
    #[serde(rename = "KOMGO.CreditLines.Revoke")]
    Revoke,
    #[serde(rename = "KOMGO.CreditLines.Request")]
    Request,
    #[serde(rename = "KOMGO.CreditLines.RequestDeclined")]
    RequestDeclined,
}

impl MessageType {
    pub const ALL: [MessageType; 4] = [
        MessageType::Share,
        MessageType::Revoke,
        MessageType::Request,
        MessageType::RequestDeclined,
    ];

    pub fn routing_key(&self) -> &'static str {
        match self {
            MessageType::Share => "KOMGO.CreditLines.Share",
            MessageType::Revoke => "KOMGO.CreditLines.Revoke",
            MessageType::Request => "KOMGO.CreditLines.Request",
            MessageType::RequestDeclined => "KOMGO.CreditLines.RequestDeclined",
        }
    }

    /// Message type for a routing key, `None` when the key is not known
    pub fn from_routing_key(routing_key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|message_type| message_type.routing_key() == routing_key)
    }

    /// Every routing key the service consumes
    pub fn routing_keys() -> Vec<String> {
        Self::ALL.iter().map(|t| t.routing_key().to_string()).collect()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.routing_key())
    }
}

/// Envelope of share and revoke messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope<P> {
    pub version: u32,
    pub message_type: MessageType,
    /// Sharing configuration the message was produced from
    pub static_id: String,
    pub owner_static_id: String,
    pub recepient_static_id: String,
    pub feature_type: FeatureType,
    pub payload: P,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedCreditLinePayload {
    pub context: ProductContext,
    pub counterparty_static_id: String,
    pub data: CreditLineDisclosure,
}

/// Just enough to identify the credit line to retract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedCreditLinePayload {
    pub context: ProductContext,
    pub counterparty_static_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedDepositLoanPayload {
    #[serde(flatten)]
    pub context: DepositLoanContext,
    pub data: DepositLoanDisclosure,
}

pub type SharedCreditLineMessage = MessageEnvelope<SharedCreditLinePayload>;
pub type RevokedCreditLineMessage = MessageEnvelope<RevokedCreditLinePayload>;
pub type SharedDepositLoanMessage = MessageEnvelope<SharedDepositLoanPayload>;
pub type RevokedDepositLoanMessage = MessageEnvelope<DepositLoanContext>;

/// Credit-line request or decline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditLineRequestMessage {
    pub version: u32,
    pub message_type: MessageType,
    pub context: ProductContext,
    /// Sender
    pub company_static_id: String,
    pub counterparty_static_id: String,
    pub recepient_static_id: String,
    pub feature_type: FeatureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositLoanRequestPayload {
    #[serde(flatten)]
    pub context: DepositLoanContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Deposit/loan request or decline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositLoanRequestMessage {
    pub version: u32,
    pub message_type: MessageType,
    /// Sender
    pub company_static_id: String,
    pub recepient_static_id: String,
    pub feature_type: FeatureType,
    pub payload: DepositLoanRequestPayload,
}

/// Any message this service sends
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundPayload {
    SharedCreditLine(SharedCreditLineMessage),
    RevokedCreditLine(RevokedCreditLineMessage),
    SharedDepositLoan(SharedDepositLoanMessage),
    RevokedDepositLoan(RevokedDepositLoanMessage),
    CreditLineRequest(CreditLineRequestMessage),
    DepositLoanRequest(DepositLoanRequestMessage),
}

impl OutboundPayload {
    pub fn message_type(&self) -> MessageType {
        match self {
            OutboundPayload::SharedCreditLine(m) => m.message_type,
            OutboundPayload::RevokedCreditLine(m) => m.message_type,
            OutboundPayload::SharedDepositLoan(m) => m.message_type,
            OutboundPayload::RevokedDepositLoan(m) => m.message_type,
            OutboundPayload::CreditLineRequest(m) => m.message_type,
            OutboundPayload::DepositLoanRequest(m) => m.message_type,
        }
    }

    pub fn recipient_static_id(&self) -> &str {
        match self {
            OutboundPayload::SharedCreditLine(m) => &m.recepient_static_id,
            OutboundPayload::RevokedCreditLine(m) => &m.recepient_static_id,
            OutboundPayload::SharedDepositLoan(m) => &m.recepient_static_id,
            OutboundPayload::RevokedDepositLoan(m) => &m.recepient_static_id,
            OutboundPayload::CreditLineRequest(m) => &m.recepient_static_id,
            OutboundPayload::DepositLoanRequest(m) => &m.recepient_static_id,
        }
    }
}

/// Message ready for the outbound dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub message_type: MessageType,
    pub recipient_static_id: String,
    pub payload: OutboundPayload,
}

impl From<OutboundPayload> for OutboundMessage {
    fn from(payload: OutboundPayload) -> Self {
        Self {
            message_type: payload.message_type(),
            recipient_static_id: payload.recipient_static_id().to_string(),
            payload,
        }
    }
}
