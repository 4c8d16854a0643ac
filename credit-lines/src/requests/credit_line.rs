//! Credit-line requests

use crate::{
    data::{CreditLineRequestDataAgent, CreditLineRequestFilter},
    messages::{CreditLineRequestMessage, MessageType, MESSAGE_VERSION},
    models::{CreditLineRequest, ProductContext, RequestStatus, RequestType},
    request_client::RequestClient,
    sharing::{CreditLineRequestKey, PendingRequestCorrelator},
    Error, Result,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub struct CreditLineRequestService {
    company_static_id: String,
    data_agent: Arc<dyn CreditLineRequestDataAgent>,
    request_client: Arc<RequestClient>,
}

impl CreditLineRequestService {
    pub fn new(
        company_static_id: impl Into<String>,
        data_agent: Arc<dyn CreditLineRequestDataAgent>,
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
        counterparty_static_id: &str,
        context: &ProductContext,
        comment: Option<String>,
    ) -> CreditLineRequestMessage {
        CreditLineRequestMessage {
            version: MESSAGE_VERSION,
            message_type,
            context: context.clone(),
            company_static_id: self.company_static_id.clone(),
            counterparty_static_id: counterparty_static_id.to_string(),
            recepient_static_id: recipient_static_id.to_string(),
            feature_type: context.feature_type(),
            comment,
        }
    }

    /// Ask each of `company_static_ids` for the credit line it holds
    /// against `counterparty_static_id`
    pub async fn create(
        &self,
        counterparty_static_id: &str,
        context: &ProductContext,
        company_static_ids: &[String],
        comment: Option<String>,
    ) -> Result<Vec<String>> {
        if company_static_ids.is_empty() {
            return Err(Error::Validation("At least one company is required".to_string()));
        }

        info!(
            counterparty = counterparty_static_id,
            companies = company_static_ids.len(),
            "Creating credit line requests"
        );

        let mut created = Vec::with_capacity(company_static_ids.len());
        for company in company_static_ids {
            let request = CreditLineRequest::new(
                RequestType::Requested,
                company.as_str(),
                counterparty_static_id,
                context.clone(),
                comment.clone(),
            );
            created.push(self.data_agent.create(request).await?);
        }

        for company in company_static_ids {
            let message = self.message(
                MessageType::Request,
                company,
                counterparty_static_id,
                context,
                comment.clone(),
            );
            self.request_client
                .send_common_request(MessageType::Request, company, &message)
                .await?;
        }

        Ok(created)
    }

    /// Oldest received request from `company_static_id` still pending
    pub async fn get_pending_request(
        &self,
        company_static_id: &str,
        counterparty_static_id: &str,
        context: &ProductContext,
    ) -> Result<Option<CreditLineRequest>> {
        let requests = self
            .data_agent
            .find(&CreditLineRequestFilter {
                context: context.clone(),
                counterparty_static_id: counterparty_static_id.to_string(),
                company_static_id: Some(company_static_id.to_string()),
                request_type: Some(RequestType::Received),
                status: Some(RequestStatus::Pending),
            })
            .await?;

        Ok(requests.into_iter().next())
    }

    /// Store a request received from another company; a repeated request
    /// only refreshes the comment of the pending one
    pub async fn request_received(&self, request: CreditLineRequest) -> Result<bool> {
        info!(
            company = %request.company_static_id,
            counterparty = %request.counterparty_static_id,
            "Request for credit line received"
        );

        let existing = self
            .get_pending_request(
                &request.company_static_id,
                &request.counterparty_static_id,
                &request.context,
            )
            .await?;

        match existing {
            Some(mut existing) => {
                info!("Request exists, updating");
                existing.comment = request.comment;
                self.data_agent.update(existing).await?;
            }
            None => {
                self.data_agent.create(request).await?;
            }
        }

        Ok(true)
    }

    /// `company_static_id` declined our request about `counterparty_static_id`
    pub async fn request_declined(
        &self,
        counterparty_static_id: &str,
        company_static_id: &str,
        context: &ProductContext,
    ) -> Result<bool> {
        let requests = self
            .data_agent
            .find(&CreditLineRequestFilter {
                context: context.clone(),
                counterparty_static_id: counterparty_static_id.to_string(),
                company_static_id: Some(company_static_id.to_string()),
                request_type: Some(RequestType::Requested),
                status: Some(RequestStatus::Pending),
            })
            .await?;

        let Some(mut request) = requests.into_iter().next() else {
            warn!(
                company = company_static_id,
                counterparty = counterparty_static_id,
                "No pending requests to decline"
            );
            return Ok(false);
        };

        request.status = RequestStatus::Declined;
        self.data_agent.update(request).await?;
        Ok(true)
    }

    /// Close requests we sent to `company_static_id`, e.g. once it shared
    pub async fn close_pending_sent_request(
        &self,
        company_static_id: &str,
        counterparty_static_id: &str,
        context: &ProductContext,
        disclosed: bool,
    ) -> Result<usize> {
        let requests = self
            .data_agent
            .find(&CreditLineRequestFilter {
                context: context.clone(),
                counterparty_static_id: counterparty_static_id.to_string(),
                company_static_id: Some(company_static_id.to_string()),
                request_type: Some(RequestType::Requested),
                status: Some(RequestStatus::Pending),
            })
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

        if closed > 0 {
            info!(company = company_static_id, closed, "Closed sent requests");
        }
        Ok(closed)
    }

    pub async fn mark_completed(
        &self,
        mut request: CreditLineRequest,
        status: RequestStatus,
    ) -> Result<bool> {
        info!(
            request = %request.static_id,
            company = %request.company_static_id,
            status = ?status,
            "Marking request as completed"
        );

        request.status = status;
        self.data_agent.update(request).await?;
        Ok(true)
    }

    /// Decline every pending received request about `counterparty_static_id`.
    ///
    /// With `request_ids`, every id must name one of those requests or
    /// nothing is declined.
    pub async fn close_all_pending_requests(
        &self,
        counterparty_static_id: &str,
        context: &ProductContext,
        request_ids: Option<&[String]>,
    ) -> Result<Vec<String>> {
        let requests = self
            .data_agent
            .find(&CreditLineRequestFilter {
                context: context.clone(),
                counterparty_static_id: counterparty_static_id.to_string(),
                company_static_id: None,
                request_type: Some(RequestType::Received),
                status: Some(RequestStatus::Pending),
            })
            .await?;

        if let Some(ids) = request_ids {
            let invalid: Vec<&str> = ids
                .iter()
                .filter(|id| !requests.iter().any(|r| &r.static_id == *id))
                .map(String::as_str)
                .collect();
            if !invalid.is_empty() {
                return Err(Error::Validation(format!(
                    "{} can't be declined",
                    invalid.join(",")
                )));
            }
        }

        if requests.is_empty() {
            info!("No pending requests to close");
            return Ok(Vec::new());
        }

        let mut declined = Vec::with_capacity(requests.len());
        for request in requests {
            let message = self.message(
                MessageType::RequestDeclined,
                &request.company_static_id,
                &request.counterparty_static_id,
                &request.context,
                None,
            );
            let recipient = request.company_static_id.clone();
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
impl PendingRequestCorrelator for CreditLineRequestService {
    type Key = CreditLineRequestKey;
    type Request = CreditLineRequest;

    async fn get_pending_request(&self, key: &CreditLineRequestKey) -> Result<Option<CreditLineRequest>> {
        CreditLineRequestService::get_pending_request(
            self,
            &key.company_static_id,
            &key.counterparty_static_id,
            &key.context,
        )
        .await
    }

    async fn mark_completed(&self, request: CreditLineRequest) -> Result<()> {
        CreditLineRequestService::mark_completed(self, request, RequestStatus::Disclosed)
            .await
            .map(|_| ())
    }
}
