//! Data agents
//!
//! Storage is external to the service; these traits are the seams it talks
//! through. [`memory`] provides in-process implementations.

pub mod memory;

pub use memory::{
    InMemoryCreditLineRequestDataAgent, InMemoryDepositLoanRequestDataAgent,
    InMemoryDisclosedCreditLineDataAgent, InMemoryDisclosedDepositLoanDataAgent,
};

use crate::{
    models::{
        CreditLineRequest, DepositLoanContext, DepositLoanRequest, DisclosedCreditLine,
        DisclosedDepositLoan, ProductContext, RequestStatus, RequestType,
    },
    Result,
};
use async_trait::async_trait;

/// Selection of credit-line requests; `None` fields match anything
#[derive(Debug, Clone, PartialEq)]
pub struct CreditLineRequestFilter {
    pub context: ProductContext,
    pub counterparty_static_id: String,
    pub company_static_id: Option<String>,
    pub request_type: Option<RequestType>,
    pub status: Option<RequestStatus>,
}

impl CreditLineRequestFilter {
    pub fn matches(&self, request: &CreditLineRequest) -> bool {
        request.context == self.context
            && request.counterparty_static_id == self.counterparty_static_id
            && self
                .company_static_id
                .as_ref()
                .map_or(true, |company| &request.company_static_id == company)
            && self.request_type.map_or(true, |t| request.request_type == t)
            && self.status.map_or(true, |s| request.status == s)
    }
}

/// Selection of deposit/loan requests; `None` fields match anything
#[derive(Debug, Clone, PartialEq)]
pub struct DepositLoanRequestFilter {
    pub context: DepositLoanContext,
    pub company_static_id: Option<String>,
    pub request_type: Option<RequestType>,
    pub status: Option<RequestStatus>,
}

impl DepositLoanRequestFilter {
    pub fn matches(&self, request: &DepositLoanRequest) -> bool {
        request.context == self.context
            && self
                .company_static_id
                .as_ref()
                .map_or(true, |company| &request.company_static_id == company)
            && self.request_type.map_or(true, |t| request.request_type == t)
            && self.status.map_or(true, |s| request.status == s)
    }
}

#[async_trait]
pub trait CreditLineRequestDataAgent: Send + Sync {
    async fn create(&self, request: CreditLineRequest) -> Result<String>;

    /// Replace a stored request; fails with `NotFound` for unknown ids
    async fn update(&self, request: CreditLineRequest) -> Result<()>;

    async fn get(&self, static_id: &str) -> Result<Option<CreditLineRequest>>;

    /// Matching requests, oldest first
    async fn find(&self, filter: &CreditLineRequestFilter) -> Result<Vec<CreditLineRequest>>;
}

#[async_trait]
pub trait DepositLoanRequestDataAgent: Send + Sync {
    async fn create(&self, request: DepositLoanRequest) -> Result<String>;

    /// Replace a stored request; fails with `NotFound` for unknown ids
    async fn update(&self, request: DepositLoanRequest) -> Result<()>;

    async fn get(&self, static_id: &str) -> Result<Option<DepositLoanRequest>>;

    /// Matching requests, oldest first
    async fn find(&self, filter: &DepositLoanRequestFilter) -> Result<Vec<DepositLoanRequest>>;
}

/// Credit lines other companies disclosed to this one
#[async_trait]
pub trait DisclosedCreditLineDataAgent: Send + Sync {
    /// Insert or replace by (owner, counterparty, context); returns the static id
    async fn upsert(&self, disclosed: DisclosedCreditLine) -> Result<String>;

    async fn find(
        &self,
        owner_static_id: &str,
        counterparty_static_id: &str,
        context: &ProductContext,
    ) -> Result<Option<DisclosedCreditLine>>;

    /// Returns whether something was deleted
    async fn delete(
        &self,
        owner_static_id: &str,
        counterparty_static_id: &str,
        context: &ProductContext,
    ) -> Result<bool>;
}

/// Deposits/loans other companies disclosed to this one
#[async_trait]
pub trait DisclosedDepositLoanDataAgent: Send + Sync {
    /// Insert or replace by (owner, context); returns the static id
    async fn upsert(&self, disclosed: DisclosedDepositLoan) -> Result<String>;

    async fn find(
        &self,
        owner_static_id: &str,
        context: &DepositLoanContext,
    ) -> Result<Option<DisclosedDepositLoan>>;

    /// Returns whether something was deleted
    async fn delete(&self, owner_static_id: &str, context: &DepositLoanContext) -> Result<bool>;
}
