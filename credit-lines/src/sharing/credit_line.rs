//! Credit-line flavor of the diff engine

use super::engine::{EnvelopeHeader, ShareDataService, ShareFlavor};
use super::visibility::resolve_field;
use crate::{
    messages::{
        MessageEnvelope, MessageType, OutboundMessage, OutboundPayload, RevokedCreditLinePayload,
        SharedCreditLinePayload, MESSAGE_VERSION,
    },
    models::{CreditLine, CreditLineDisclosure, FeatureType, ProductContext, SharedCreditLine},
};

/// Identifies the pending request a credit-line share answers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreditLineRequestKey {
    /// Requesting company, i.e. the share recipient
    pub company_static_id: String,
    pub counterparty_static_id: String,
    pub context: ProductContext,
}

/// Diff engine for credit lines
pub type ShareCreditLineService<C> =
    ShareDataService<SharedCreditLine, CreditLine, CreditLineDisclosure, C>;

/// Project a credit line through its sharing options.
///
/// Appetite gates everything else: unless it is shared and true, only the
/// appetite value itself goes out. Currency accompanies any open appetite.
/// The amount needs the line to be available; a recorded amount with no
/// availability flag counts as available.
pub fn build_credit_line_disclosure(
    shared: &SharedCreditLine,
    record: &CreditLine,
) -> CreditLineDisclosure {
    let flags = &shared.data;

    let appetite = resolve_field(Some(&flags.appetite), Some(record.appetite.unwrap_or(false)));
    if appetite != Some(true) {
        return CreditLineDisclosure {
            appetite,
            ..Default::default()
        };
    }

    let available = record
        .availability
        .or_else(|| record.availability_amount.map(|_| true));
    let availability_amount = if available == Some(true) {
        resolve_field(Some(&flags.availability_amount), record.availability_amount)
    } else {
        None
    };

    CreditLineDisclosure {
        appetite,
        currency: Some(record.currency),
        availability: resolve_field(Some(&flags.availability), available),
        availability_amount,
        credit_limit: resolve_field(Some(&flags.credit_limit), record.credit_limit),
        fee: resolve_field(Some(&flags.fee), flags.fee.fee.or(record.fee)),
        maximum_tenor: resolve_field(
            Some(&flags.maximum_tenor),
            flags.maximum_tenor.maximum_tenor.or(record.maximum_tenor),
        ),
        margin: resolve_field(Some(&flags.margin), flags.margin.margin.or(record.margin)),
    }
}

fn recipient(shared: &SharedCreditLine) -> &str {
    &shared.shared_with_static_id
}

fn appetite_shared(shared: &SharedCreditLine) -> bool {
    shared.data.appetite.shared
}

fn feature_type(record: &CreditLine) -> FeatureType {
    record.context.feature_type()
}

fn build_message(
    header: &EnvelopeHeader<'_>,
    shared: &SharedCreditLine,
    record: &CreditLine,
    data: CreditLineDisclosure,
) -> OutboundMessage {
    OutboundPayload::SharedCreditLine(MessageEnvelope {
        version: MESSAGE_VERSION,
        message_type: MessageType::Share,
        static_id: shared.static_id.clone(),
        owner_static_id: header.owner_static_id.to_string(),
        recepient_static_id: shared.shared_with_static_id.clone(),
        feature_type: header.feature_type,
        payload: SharedCreditLinePayload {
            context: record.context.clone(),
            counterparty_static_id: record.counterparty_static_id.clone(),
            data,
        },
    })
    .into()
}

fn build_revoke_message(
    header: &EnvelopeHeader<'_>,
    shared: &SharedCreditLine,
    record: &CreditLine,
) -> OutboundMessage {
    OutboundPayload::RevokedCreditLine(MessageEnvelope {
        version: MESSAGE_VERSION,
        message_type: MessageType::Revoke,
        static_id: shared.static_id.clone(),
        owner_static_id: header.owner_static_id.to_string(),
        recepient_static_id: shared.shared_with_static_id.clone(),
        feature_type: header.feature_type,
        payload: RevokedCreditLinePayload {
            context: record.context.clone(),
            counterparty_static_id: record.counterparty_static_id.clone(),
        },
    })
    .into()
}

fn request_key(shared: &SharedCreditLine, record: &CreditLine) -> CreditLineRequestKey {
    CreditLineRequestKey {
        company_static_id: shared.shared_with_static_id.clone(),
        counterparty_static_id: record.counterparty_static_id.clone(),
        context: record.context.clone(),
    }
}

/// Flavor value wiring the credit-line builders into the engine
pub fn credit_line_flavor(
) -> ShareFlavor<SharedCreditLine, CreditLine, CreditLineDisclosure, CreditLineRequestKey> {
    ShareFlavor {
        name: "credit_line",
        recipient,
        appetite_shared,
        feature_type,
        build_payload: build_credit_line_disclosure,
        build_message,
        build_revoke_message,
        request_key,
    }
}
