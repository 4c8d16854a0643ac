//! Deposit/loan processors

use super::{require_non_empty, require_recipient, EventProcessor, InboundMessage, ProcessingOutcome};
use crate::{
    data::DisclosedDepositLoanDataAgent,
    messages::{DepositLoanRequestMessage, MessageType, RevokedDepositLoanMessage, SharedDepositLoanMessage},
    models::{DepositLoanContext, DepositLoanRequest, DepositLoanType, DisclosedDepositLoan, FeatureType, RequestType},
    requests::DepositLoanRequestService,
    Error, Result,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// The envelope's feature type must name the context's kind
fn check_kind(feature_type: FeatureType, context: &DepositLoanContext) -> Result<()> {
    if DepositLoanType::from_feature_type(feature_type) != Some(context.kind) {
        return Err(Error::InvalidPayload(format!(
            "featureType {} does not match {:?}",
            feature_type, context.kind
        )));
    }
    Ok(())
}

pub struct ShareDepositLoanProcessor {
    company_static_id: String,
    data_agent: Arc<dyn DisclosedDepositLoanDataAgent>,
    request_service: Arc<DepositLoanRequestService>,
}

impl ShareDepositLoanProcessor {
    pub fn new(
        company_static_id: impl Into<String>,
        data_agent: Arc<dyn DisclosedDepositLoanDataAgent>,
        request_service: Arc<DepositLoanRequestService>,
    ) -> Self {
        Self {
            company_static_id: company_static_id.into(),
            data_agent,
            request_service,
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<bool> {
        let shared: SharedDepositLoanMessage = message.decode()?;
        require_non_empty("ownerStaticId", &shared.owner_static_id)?;
        require_recipient(&self.company_static_id, &shared.recepient_static_id)?;
        check_kind(shared.feature_type, &shared.payload.context)?;

        let context = shared.payload.context;
        info!(owner = %shared.owner_static_id, context = %context, "Deposit/loan shared with us");

        self.data_agent
            .upsert(DisclosedDepositLoan {
                static_id: Uuid::new_v4().to_string(),
                owner_static_id: shared.owner_static_id.clone(),
                context,
                feature_type: shared.feature_type,
                data: shared.payload.data,
                updated_at: Utc::now(),
            })
            .await?;

        self.request_service
            .close_pending_sent_request(&shared.owner_static_id, context, true)
            .await?;

        Ok(true)
    }
}

#[async_trait]
impl EventProcessor for ShareDepositLoanProcessor {
    fn name(&self) -> &'static str {
        "share_deposit_loan"
    }

    fn should_process(&self, message: &InboundMessage) -> bool {
        message.is(MessageType::Share, &FeatureType::DEPOSIT_LOAN)
    }

    async fn process_message(&self, message: &InboundMessage) -> ProcessingOutcome {
        ProcessingOutcome::from_result(self.process(message).await)
    }
}

pub struct RevokeDepositLoanProcessor {
    company_static_id: String,
    data_agent: Arc<dyn DisclosedDepositLoanDataAgent>,
}

impl RevokeDepositLoanProcessor {
    pub fn new(company_static_id: impl Into<String>, data_agent: Arc<dyn DisclosedDepositLoanDataAgent>) -> Self {
        Self {
            company_static_id: company_static_id.into(),
            data_agent,
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<bool> {
        let revoked: RevokedDepositLoanMessage = message.decode()?;
        require_non_empty("ownerStaticId", &revoked.owner_static_id)?;
        require_recipient(&self.company_static_id, &revoked.recepient_static_id)?;
        check_kind(revoked.feature_type, &revoked.payload)?;

        let deleted = self
            .data_agent
            .delete(&revoked.owner_static_id, &revoked.payload)
            .await?;

        info!(owner = %revoked.owner_static_id, context = %revoked.payload, deleted, "Deposit/loan revoked");
        Ok(deleted)
    }
}

#[async_trait]
impl EventProcessor for RevokeDepositLoanProcessor {
    fn name(&self) -> &'static str {
        "revoke_deposit_loan"
    }

    fn should_process(&self, message: &InboundMessage) -> bool {
        message.is(MessageType::Revoke, &FeatureType::DEPOSIT_LOAN)
    }

    async fn process_message(&self, message: &InboundMessage) -> ProcessingOutcome {
        ProcessingOutcome::from_result(self.process(message).await)
    }
}

pub struct DepositLoanRequestProcessor {
    company_static_id: String,
    request_service: Arc<DepositLoanRequestService>,
}

impl DepositLoanRequestProcessor {
    pub fn new(company_static_id: impl Into<String>, request_service: Arc<DepositLoanRequestService>) -> Self {
        Self {
            company_static_id: company_static_id.into(),
            request_service,
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<bool> {
        let request: DepositLoanRequestMessage = message.decode()?;
        require_non_empty("companyStaticId", &request.company_static_id)?;
        require_recipient(&self.company_static_id, &request.recepient_static_id)?;
        check_kind(request.feature_type, &request.payload.context)?;

        self.request_service
            .request_received(DepositLoanRequest::new(
                RequestType::Received,
                request.company_static_id,
                request.payload.context,
                request.payload.comment,
            ))
            .await
    }
}

#[async_trait]
impl EventProcessor for DepositLoanRequestProcessor {
    fn name(&self) -> &'static str {
        "deposit_loan_request"
    }

    fn should_process(&self, message: &InboundMessage) -> bool {
        message.is(MessageType::Request, &FeatureType::DEPOSIT_LOAN)
    }

    async fn process_message(&self, message: &InboundMessage) -> ProcessingOutcome {
        ProcessingOutcome::from_result(self.process(message).await)
    }
}

pub struct DepositLoanRequestDeclinedProcessor {
    company_static_id: String,
    request_service: Arc<DepositLoanRequestService>,
}

impl DepositLoanRequestDeclinedProcessor {
    pub fn new(company_static_id: impl Into<String>, request_service: Arc<DepositLoanRequestService>) -> Self {
        Self {
            company_static_id: company_static_id.into(),
            request_service,
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<bool> {
        let declined: DepositLoanRequestMessage = message.decode()?;
        require_non_empty("companyStaticId", &declined.company_static_id)?;
        require_recipient(&self.company_static_id, &declined.recepient_static_id)?;

        self.request_service
            .request_declined(&declined.company_static_id, declined.payload.context)
            .await
    }
}

#[async_trait]
impl EventProcessor for DepositLoanRequestDeclinedProcessor {
    fn name(&self) -> &'static str {
        "deposit_loan_request_declined"
    }

    fn should_process(&self, message: &InboundMessage) -> bool {
        message.is(MessageType::RequestDeclined, &FeatureType::DEPOSIT_LOAN)
    }

    async fn process_message(&self, message: &InboundMessage) -> ProcessingOutcome {
        ProcessingOutcome::from_result(self.process(message).await)
    }
}
