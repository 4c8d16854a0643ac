//! Deposit/loan requests

use crate::{
    data::{DepositLoanRequestDataAgent, DepositLoanRequestFilter},
    messages::{DepositLoanRequestMessage, DepositLoanRequestPayload, MessageType, MESSAGE_VERSION},
    models::{DepositLoanContext, DepositLoanRequest, RequestStatus, RequestType},
    request_client::RequestClient,
    sharing::{DepositLoanRequestKey, PendingRequestCorrelator},
    Error, Result,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Same workflow as [`super::CreditLineRequestService`], keyed by the
/// offer's context instead of a counterparty
pub struct DepositLoanRequestService {
    company_static_id: String,
    data_agent: Arc<dyn DepositLoanRequestDataAgent>,
    request_client: Arc<RequestClient>,
}

impl DepositLoanRequestService {
    pub fn new(
        company_static_id: impl Into<String>,
        data_agent: Arc<dyn DepositLoanRequestDataAgent>,
        request_client: Arc<RequestClient>,
    ) -> Self {
        Self {
            company_static_id: company_static_id.into(),
            data_agent,
            request_client,
        }
    }

    fn message(
        &self,
        message_type: MessageType,
        recipient_static_id: &str,
        context: DepositLoanContext,
        comment: Option<String>,
    ) -> DepositLoanRequestMessage {
        DepositLoanRequestMessage {
            version: MESSAGE_VERSION,
            message_type,
            company_static_id: self.company_static_id.clone(),
            recepient_static_id: recipient_static_id.to_string(),
            feature_type: context.kind.feature_type(),
            payload: DepositLoanRequestPayload { context, comment },
        }
    }

    fn filter(
        &self,
        context: DepositLoanContext,
        company_static_id: Option<&str>,
        request_type: RequestType,
    ) -> DepositLoanRequestFilter {
        DepositLoanRequestFilter {
            context,
            company_static_id: company_static_id.map(str::to_string),
            request_type: Some(request_type),
            status: Some(RequestStatus::Pending),
        }
    }

    pub async fn create(
        &self,
        context: DepositLoanContext,
        company_static_ids: &[String],
        comment: Option<String>,
    ) -> Result<Vec<String>> {
        if company_static_ids.is_empty() {
            return Err(Error::Validation("At least one company is required".to_string()));
        }

        info!(context = %context, companies = company_static_ids.len(), "Creating deposit/loan requests");

        let mut created = Vec::with_capacity(company_static_ids.len());
        for company in company_static_ids {
            let request = DepositLoanRequest::new(RequestType::Requested, company.as_str(), context, comment.clone());
            created.push(self.data_agent.create(request).await?);
        }

        for company in company_static_ids {
            let message = self.message(MessageType::Request, company, context, comment.clone());
            self.request_client
                .send_common_request(MessageType::Request, company, &message)
                .await?;
        }

        Ok(created)
    }

    pub async fn get_pending_request(
        &self,
        company_static_id: &str,
        context: DepositLoanContext,
    ) -> Result<Option<DepositLoanRequest>> {
        let requests = self
            .data_agent
            .find(&self.filter(context, Some(company_static_id), RequestType::Received))
            .await?;
        Ok(requests.into_iter().next())
    }

    pub async fn request_received(&self, request: DepositLoanRequest) -> Result<bool> {
        info!(company = %request.company_static_id, context = %request.context, "Request for deposit/loan received");

        match self
            .get_pending_request(&request.company_static_id, request.context)
            .await?
        {
            Some(mut existing) => {
                existing.comment = request.comment;
                self.data_agent.update(existing).await?;
            }
            None => {
                self.data_agent.create(request).await?;
            }
        }

        Ok(true)
    }

    pub async fn request_declined(&self, company_static_id: &str, context: DepositLoanContext) -> Result<bool> {
        let requests = self
            .data_agent
            .find(&self.filter(context, Some(company_static_id), RequestType::Requested))
            .await?;

        let Some(mut request) = requests.into_iter().next() else {
            warn!(company = company_static_id, context = %context, "No pending requests to decline");
            return Ok(false);
        };

        request.status = RequestStatus::Declined;
        self.data_agent.update(request).await?;
        Ok(true)
    }

    pub async fn close_pending_sent_request(
        &self,
        company_static_id: &str,
        context: DepositLoanContext,
        disclosed: bool,
    ) -> Result<usize> {
        let requests = self
            .data_agent
            .find(&self.filter(context, Some(company_static_id), RequestType::Requested))
            .await?;

        let status = if disclosed {
            RequestStatus::Disclosed
        } else {
            RequestStatus::Declined
        };

        let closed = requests.len();
        for mut request in requests {
            request.status = status;
            self.data_agent.update(request).await?;
        }
        Ok(closed)
    }

    pub async fn mark_completed(&self, mut request: DepositLoanRequest, status: RequestStatus) -> Result<bool> {
        info!(request = %request.static_id, status = ?status, "Marking request as completed");
        request.status = status;
        self.data_agent.update(request).await?;
        Ok(true)
    }

    /// Decline every pending received request for `context`
    pub async fn close_all_pending_requests(
        &self,
        context: DepositLoanContext,
        request_ids: Option<&[String]>,
    ) -> Result<Vec<String>> {
        let requests = self
            .data_agent
            .find(&self.filter(context, None, RequestType::Received))
            .await?;

        if let Some(ids) = request_ids {
            let invalid: Vec<&str> = ids
                .iter()
                .filter(|id| !requests.iter().any(|r| &r.static_id == *id))
                .map(String::as_str)
                .collect();
            if !invalid.is_empty() {
                return Err(Error::Validation(format!("{} can't be declined", invalid.join(","))));
            }
        }

        let mut declined = Vec::with_capacity(requests.len());
        for request in requests {
            let recipient = request.company_static_id.clone();
            let message = self.message(MessageType::RequestDeclined, &recipient, request.context, request.comment.clone());
            declined.push(request.static_id.clone());

            self.mark_completed(request, RequestStatus::Declined).await?;
            self.request_client
                .send_common_request(MessageType::RequestDeclined, &recipient, &message)
                .await?;
        }

        Ok(declined)
    }
}

#[async_trait]
impl PendingRequestCorrelator for DepositLoanRequestService {
    type Key = DepositLoanRequestKey;
    type Request = DepositLoanRequest;

    async fn get_pending_request(&self, key: &DepositLoanRequestKey) -> Result<Option<DepositLoanRequest>> {
        DepositLoanRequestService::get_pending_request(self, &key.company_static_id, key.context).await
    }

    async fn mark_completed(&self, request: DepositLoanRequest) -> Result<()> {
        DepositLoanRequestService::mark_completed(self, request, RequestStatus::Disclosed)
            .await
            .map(|_| ())
    }
}
