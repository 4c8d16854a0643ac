//! Deposit/loan flavor of the diff engine

use super::engine::{EnvelopeHeader, ShareDataService, ShareFlavor};
use super::visibility::resolve_field;
use crate::{
    messages::{
        MessageEnvelope, MessageType, OutboundMessage, OutboundPayload, SharedDepositLoanPayload,
        MESSAGE_VERSION,
    },
    models::{DepositLoan, DepositLoanContext, DepositLoanDisclosure, FeatureType, SharedDepositLoan},
};

/// Identifies the pending request a deposit/loan share answers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepositLoanRequestKey {
    pub company_static_id: String,
    pub context: DepositLoanContext,
}

/// Diff engine for deposits and loans
pub type ShareDepositLoanService<C> =
    ShareDataService<SharedDepositLoan, DepositLoan, DepositLoanDisclosure, C>;

/// Project a deposit/loan through its sharing options; pricing only goes
/// out with an open appetite
pub fn build_deposit_loan_disclosure(
    shared: &SharedDepositLoan,
    record: &DepositLoan,
) -> DepositLoanDisclosure {
    let appetite = resolve_field(Some(&shared.appetite), Some(record.appetite.unwrap_or(false)));
    if appetite != Some(true) {
        return DepositLoanDisclosure {
            appetite,
            pricing: None,
        };
    }

    DepositLoanDisclosure {
        appetite,
        pricing: resolve_field(Some(&shared.pricing), shared.pricing.pricing.or(record.pricing)),
    }
}

fn recipient(shared: &SharedDepositLoan) -> &str {
    &shared.shared_with_static_id
}

fn appetite_shared(shared: &SharedDepositLoan) -> bool {
    shared.appetite.shared
}

fn feature_type(record: &DepositLoan) -> FeatureType {
    record.kind.feature_type()
}

fn build_message(
    header: &EnvelopeHeader<'_>,
    shared: &SharedDepositLoan,
    record: &DepositLoan,
    data: DepositLoanDisclosure,
) -> OutboundMessage {
    OutboundPayload::SharedDepositLoan(MessageEnvelope {
        version: MESSAGE_VERSION,
        message_type: MessageType::Share,
        static_id: shared.static_id.clone(),
        owner_static_id: header.owner_static_id.to_string(),
        recepient_static_id: shared.shared_with_static_id.clone(),
        feature_type: header.feature_type,
        payload: SharedDepositLoanPayload {
            context: record.context(),
            data,
        },
    })
    .into()
}

fn build_revoke_message(
    header: &EnvelopeHeader<'_>,
    shared: &SharedDepositLoan,
    record: &DepositLoan,
) -> OutboundMessage {
    OutboundPayload::RevokedDepositLoan(MessageEnvelope {
        version: MESSAGE_VERSION,
        message_type: MessageType::Revoke,
        static_id: shared.static_id.clone(),
        owner_static_id: header.owner_static_id.to_string(),
        recepient_static_id: shared.shared_with_static_id.clone(),
        feature_type: header.feature_type,
        payload: record.context(),
    })
    .into()
}

fn request_key(shared: &SharedDepositLoan, record: &DepositLoan) -> DepositLoanRequestKey {
    DepositLoanRequestKey {
        company_static_id: shared.shared_with_static_id.clone(),
        context: record.context(),
    }
}

/// Flavor value wiring the deposit/loan builders into the engine
pub fn deposit_loan_flavor(
) -> ShareFlavor<SharedDepositLoan, DepositLoan, DepositLoanDisclosure, DepositLoanRequestKey> {
    ShareFlavor {
        name: "deposit_loan",
        recipient,
        appetite_shared,
        feature_type,
        build_payload: build_deposit_loan_disclosure,
        build_message,
        build_revoke_message,
        request_key,
    }
}
