//! Disclosure requests

use super::{DepositLoanContext, ProductContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a request as seen by this company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Sent by this company
    Requested,
    /// Received from another company
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Disclosed,
    Declined,
}

/// Request for disclosure of a credit line.
///
/// `company_static_id` is the requesting company for received requests and
/// the asked company for sent ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditLineRequest {
    pub static_id: String,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub company_static_id: String,
    pub counterparty_static_id: String,
    pub context: ProductContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditLineRequest {
    /// New pending request
    pub fn new(
        request_type: RequestType,
        company_static_id: impl Into<String>,
        counterparty_static_id: impl Into<String>,
        context: ProductContext,
        comment: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            static_id: Uuid::new_v4().to_string(),
            request_type,
            status: RequestStatus::Pending,
            company_static_id: company_static_id.into(),
            counterparty_static_id: counterparty_static_id.into(),
            context,
            comment,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Request for disclosure of a deposit/loan offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositLoanRequest {
    pub static_id: String,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub company_static_id: String,
    pub context: DepositLoanContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DepositLoanRequest {
    /// New pending request
    pub fn new(
        request_type: RequestType,
        company_static_id: impl Into<String>,
        context: DepositLoanContext,
        comment: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            static_id: Uuid::new_v4().to_string(),
            request_type,
            status: RequestStatus::Pending,
            company_static_id: company_static_id.into(),
            context,
            comment,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}
