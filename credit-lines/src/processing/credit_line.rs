//! Credit-line processors

use super::{require_non_empty, require_recipient, EventProcessor, InboundMessage, ProcessingOutcome};
use crate::{
    data::DisclosedCreditLineDataAgent,
    messages::{CreditLineRequestMessage, MessageType, RevokedCreditLineMessage, SharedCreditLineMessage},
    models::{CreditLineRequest, DisclosedCreditLine, FeatureType, RequestType},
    requests::CreditLineRequestService,
    Result,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Stores credit lines other companies share with us
pub struct ShareCreditLineProcessor {
    company_static_id: String,
    data_agent: Arc<dyn DisclosedCreditLineDataAgent>,
    request_service: Arc<CreditLineRequestService>,
}

impl ShareCreditLineProcessor {
    pub fn new(
        company_static_id: impl Into<String>,
        data_agent: Arc<dyn DisclosedCreditLineDataAgent>,
        request_service: Arc<CreditLineRequestService>,
    ) -> Self {
        Self {
            company_static_id: company_static_id.into(),
            data_agent,
            request_service,
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<bool> {
        let shared: SharedCreditLineMessage = message.decode()?;
        require_non_empty("ownerStaticId", &shared.owner_static_id)?;
        require_non_empty("counterpartyStaticId", &shared.payload.counterparty_static_id)?;
        require_recipient(&self.company_static_id, &shared.recepient_static_id)?;

        info!(
            owner = %shared.owner_static_id,
            counterparty = %shared.payload.counterparty_static_id,
            "Credit line shared with us"
        );

        self.data_agent
            .upsert(DisclosedCreditLine {
                static_id: Uuid::new_v4().to_string(),
                owner_static_id: shared.owner_static_id.clone(),
                counterparty_static_id: shared.payload.counterparty_static_id.clone(),
                context: shared.payload.context.clone(),
                feature_type: shared.feature_type,
                data: shared.payload.data,
                updated_at: Utc::now(),
            })
            .await?;

        self.request_service
            .close_pending_sent_request(
                &shared.owner_static_id,
                &shared.payload.counterparty_static_id,
                &shared.payload.context,
                true,
            )
            .await?;

        Ok(true)
    }
}

#[async_trait]
impl EventProcessor for ShareCreditLineProcessor {
    fn name(&self) -> &'static str {
        "share_credit_line"
    }

    fn should_process(&self, message: &InboundMessage) -> bool {
        message.is(MessageType::Share, &FeatureType::CREDIT_LINE)
    }

    async fn process_message(&self, message: &InboundMessage) -> ProcessingOutcome {
        ProcessingOutcome::from_result(self.process(message).await)
    }
}

/// Removes credit lines their owner stopped sharing
pub struct RevokeCreditLineProcessor {
    company_static_id: String,
    data_agent: Arc<dyn DisclosedCreditLineDataAgent>,
}

impl RevokeCreditLineProcessor {
    pub fn new(company_static_id: impl Into<String>, data_agent: Arc<dyn DisclosedCreditLineDataAgent>) -> Self {
        Self {
            company_static_id: company_static_id.into(),
            data_agent,
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<bool> {
        let revoked: RevokedCreditLineMessage = message.decode()?;
        require_non_empty("ownerStaticId", &revoked.owner_static_id)?;
        require_recipient(&self.company_static_id, &revoked.recepient_static_id)?;

        let deleted = self
            .data_agent
            .delete(
                &revoked.owner_static_id,
                &revoked.payload.counterparty_static_id,
                &revoked.payload.context,
            )
            .await?;

        info!(
            owner = %revoked.owner_static_id,
            counterparty = %revoked.payload.counterparty_static_id,
            deleted,
            "Credit line revoked"
        );
        Ok(deleted)
    }
}

#[async_trait]
impl EventProcessor for RevokeCreditLineProcessor {
    fn name(&self) -> &'static str {
        "revoke_credit_line"
    }

    fn should_process(&self, message: &InboundMessage) -> bool {
        message.is(MessageType::Revoke, &FeatureType::CREDIT_LINE)
    }

    async fn process_message(&self, message: &InboundMessage) -> ProcessingOutcome {
        ProcessingOutcome::from_result(self.process(message).await)
    }
}

pub struct CreditLineRequestProcessor {
    company_static_id: String,
    request_service: Arc<CreditLineRequestService>,
}

impl CreditLineRequestProcessor {
    pub fn new(company_static_id: impl Into<String>, request_service: Arc<CreditLineRequestService>) -> Self {
        Self {
            company_static_id: company_static_id.into(),
            request_service,
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<bool> {
        let request: CreditLineRequestMessage = message.decode()?;
        require_non_empty("companyStaticId", &request.company_static_id)?;
        require_non_empty("counterpartyStaticId", &request.counterparty_static_id)?;
        require_recipient(&self.company_static_id, &request.recepient_static_id)?;

        self.request_service
            .request_received(CreditLineRequest::new(
                RequestType::Received,
                request.company_static_id,
                request.counterparty_static_id,
                request.context,
                request.comment,
            ))
            .await
    }
}

#[async_trait]
impl EventProcessor for CreditLineRequestProcessor {
    fn name(&self) -> &'static str {
        "credit_line_request"
    }

    fn should_process(&self, message: &InboundMessage) -> bool {
        message.is(MessageType::Request, &FeatureType::CREDIT_LINE)
    }

    async fn process_message(&self, message: &InboundMessage) -> ProcessingOutcome {
        ProcessingOutcome::from_result(self.process(message).await)
    }
}

pub struct CreditLineRequestDeclinedProcessor {
    company_static_id: String,
    request_service: Arc<CreditLineRequestService>,
}

impl CreditLineRequestDeclinedProcessor {
    pub fn new(company_static_id: impl Into<String>, request_service: Arc<CreditLineRequestService>) -> Self {
        Self {
            company_static_id: company_static_id.into(),
            request_service,
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<bool> {
        let declined: CreditLineRequestMessage = message.decode()?;
        require_non_empty("companyStaticId", &declined.company_static_id)?;
        require_recipient(&self.company_static_id, &declined.recepient_static_id)?;

        self.request_service
            .request_declined(
                &declined.counterparty_static_id,
                &declined.company_static_id,
                &declined.context,
            )
            .await
    }
}

#[async_trait]
impl EventProcessor for CreditLineRequestDeclinedProcessor {
    fn name(&self) -> &'static str {
        "credit_line_request_declined"
    }

    fn should_process(&self, message: &InboundMessage) -> bool {
        message.is(MessageType::RequestDeclined, &FeatureType::CREDIT_LINE)
    }

    async fn process_message(&self, message: &InboundMessage) -> ProcessingOutcome {
        ProcessingOutcome::from_result(self.process(message).await)
    }
}
