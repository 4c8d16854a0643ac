//! In-memory data agents

use super::{
    CreditLineRequestDataAgent, CreditLineRequestFilter, DepositLoanRequestDataAgent,
    DepositLoanRequestFilter, DisclosedCreditLineDataAgent, DisclosedDepositLoanDataAgent,
};
use crate::{
    models::{
        CreditLineRequest, DepositLoanContext, DepositLoanRequest, DisclosedCreditLine,
        DisclosedDepositLoan, ProductContext,
    },
    Error, Result,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryCreditLineRequestDataAgent {
    requests: DashMap<String, CreditLineRequest>,
}

impl InMemoryCreditLineRequestDataAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[async_trait]
impl CreditLineRequestDataAgent for InMemoryCreditLineRequestDataAgent {
    async fn create(&self, request: CreditLineRequest) -> Result<String> {
        let static_id = request.static_id.clone();
        match self.requests.entry(static_id.clone()) {
            Entry::Occupied(_) => Err(Error::Validation(format!(
                "Credit line request {} already exists",
                static_id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(request);
                Ok(static_id)
            }
        }
    }

    async fn update(&self, mut request: CreditLineRequest) -> Result<()> {
        let mut stored = self
            .requests
            .get_mut(&request.static_id)
            .ok_or_else(|| Error::NotFound(format!("Credit line request {}", request.static_id)))?;
        request.updated_at = Utc::now();
        *stored = request;
        Ok(())
    }

    async fn get(&self, static_id: &str) -> Result<Option<CreditLineRequest>> {
        Ok(self.requests.get(static_id).map(|r| r.value().clone()))
    }

    async fn find(&self, filter: &CreditLineRequestFilter) -> Result<Vec<CreditLineRequest>> {
        let mut found: Vec<CreditLineRequest> = self
            .requests
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        found.sort_by_key(|r| r.created_at);
        Ok(found)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDepositLoanRequestDataAgent {
    requests: DashMap<String, DepositLoanRequest>,
}

impl InMemoryDepositLoanRequestDataAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[async_trait]
impl DepositLoanRequestDataAgent for InMemoryDepositLoanRequestDataAgent {
    async fn create(&self, request: DepositLoanRequest) -> Result<String> {
        let static_id = request.static_id.clone();
        match self.requests.entry(static_id.clone()) {
            Entry::Occupied(_) => Err(Error::Validation(format!(
                "Deposit/loan request {} already exists",
                static_id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(request);
                Ok(static_id)
            }
        }
    }

    async fn update(&self, mut request: DepositLoanRequest) -> Result<()> {
        let mut stored = self
            .requests
            .get_mut(&request.static_id)
            .ok_or_else(|| Error::NotFound(format!("Deposit/loan request {}", request.static_id)))?;
        request.updated_at = Utc::now();
        *stored = request;
        Ok(())
    }

    async fn get(&self, static_id: &str) -> Result<Option<DepositLoanRequest>> {
        Ok(self.requests.get(static_id).map(|r| r.value().clone()))
    }

    async fn find(&self, filter: &DepositLoanRequestFilter) -> Result<Vec<DepositLoanRequest>> {
        let mut found: Vec<DepositLoanRequest> = self
            .requests
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        found.sort_by_key(|r| r.created_at);
        Ok(found)
    }
}

type CreditLineKey = (String, String, ProductContext);

#[derive(Debug, Default)]
pub struct InMemoryDisclosedCreditLineDataAgent {
    disclosed: DashMap<CreditLineKey, DisclosedCreditLine>,
}

impl InMemoryDisclosedCreditLineDataAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.disclosed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disclosed.is_empty()
    }
}

#[async_trait]
impl DisclosedCreditLineDataAgent for InMemoryDisclosedCreditLineDataAgent {
    async fn upsert(&self, mut disclosed: DisclosedCreditLine) -> Result<String> {
        let key = (
            disclosed.owner_static_id.clone(),
            disclosed.counterparty_static_id.clone(),
            disclosed.context.clone(),
        );

        match self.disclosed.entry(key) {
            Entry::Occupied(mut entry) => {
                disclosed.static_id = entry.get().static_id.clone();
                debug!("Replacing disclosed credit line {}", disclosed.static_id);
                let static_id = disclosed.static_id.clone();
                entry.insert(disclosed);
                Ok(static_id)
            }
            Entry::Vacant(entry) => {
                let static_id = disclosed.static_id.clone();
                entry.insert(disclosed);
                Ok(static_id)
            }
        }
    }

    async fn find(
        &self,
        owner_static_id: &str,
        counterparty_static_id: &str,
        context: &ProductContext,
    ) -> Result<Option<DisclosedCreditLine>> {
        let key = (
            owner_static_id.to_string(),
            counterparty_static_id.to_string(),
            context.clone(),
        );
        Ok(self.disclosed.get(&key).map(|d| d.value().clone()))
    }

    async fn delete(
        &self,
        owner_static_id: &str,
        counterparty_static_id: &str,
        context: &ProductContext,
    ) -> Result<bool> {
        let key = (
            owner_static_id.to_string(),
            counterparty_static_id.to_string(),
            context.clone(),
        );
        Ok(self.disclosed.remove(&key).is_some())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDisclosedDepositLoanDataAgent {
    disclosed: DashMap<(String, DepositLoanContext), DisclosedDepositLoan>,
}

impl InMemoryDisclosedDepositLoanDataAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.disclosed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disclosed.is_empty()
    }
}

#[async_trait]
impl DisclosedDepositLoanDataAgent for InMemoryDisclosedDepositLoanDataAgent {
    async fn upsert(&self, mut disclosed: DisclosedDepositLoan) -> Result<String> {
        let key = (disclosed.owner_static_id.clone(), disclosed.context);

        match self.disclosed.entry(key) {
            Entry::Occupied(mut entry) => {
                disclosed.static_id = entry.get().static_id.clone();
                let static_id = disclosed.static_id.clone();
                entry.insert(disclosed);
                Ok(static_id)
            }
            Entry::Vacant(entry) => {
                let static_id = disclosed.static_id.clone();
                entry.insert(disclosed);
                Ok(static_id)
            }
        }
    }

    async fn find(
        &self,
        owner_static_id: &str,
        context: &DepositLoanContext,
    ) -> Result<Option<DisclosedDepositLoan>> {
        let key = (owner_static_id.to_string(), *context);
        Ok(self.disclosed.get(&key).map(|d| d.value().clone()))
    }

    async fn delete(&self, owner_static_id: &str, context: &DepositLoanContext) -> Result<bool> {
        let key = (owner_static_id.to_string(), *context);
        Ok(self.disclosed.remove(&key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CreditLineDisclosure, FeatureType, RequestStatus, RequestType,
    };

    fn filter(status: Option<RequestStatus>) -> CreditLineRequestFilter {
        CreditLineRequestFilter {
            context: ProductContext::bank_line(),
            counterparty_static_id: "buyer-1".into(),
            company_static_id: Some("corp-1".into()),
            request_type: Some(RequestType::Received),
            status,
        }
    }

    #[tokio::test]
    async fn test_request_create_find_update() {
        let agent = InMemoryCreditLineRequestDataAgent::new();
        let request = CreditLineRequest::new(
            RequestType::Received,
            "corp-1",
            "buyer-1",
            ProductContext::bank_line(),
            None,
        );
        let id = agent.create(request.clone()).await.unwrap();
        assert!(agent.create(request).await.is_err());

        let pending = agent.find(&filter(Some(RequestStatus::Pending))).await.unwrap();
        assert_eq!(pending.len(), 1);

        let mut updated = pending[0].clone();
        updated.status = RequestStatus::Disclosed;
        agent.update(updated).await.unwrap();

        assert!(agent.find(&filter(Some(RequestStatus::Pending))).await.unwrap().is_empty());
        assert_eq!(
            agent.get(&id).await.unwrap().map(|r| r.status),
            Some(RequestStatus::Disclosed)
        );
    }

    #[tokio::test]
    async fn test_update_unknown_request() {
        let agent = InMemoryCreditLineRequestDataAgent::new();
        let request = CreditLineRequest::new(
            RequestType::Requested,
            "bank-1",
            "buyer-1",
            ProductContext::bank_line(),
            None,
        );
        assert!(matches!(agent.update(request).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_disclosed_upsert_keeps_identity() {
        let agent = InMemoryDisclosedCreditLineDataAgent::new();
        let mut disclosed = DisclosedCreditLine {
            static_id: "d-1".into(),
            owner_static_id: "bank-1".into(),
            counterparty_static_id: "buyer-1".into(),
            context: ProductContext::bank_line(),
            feature_type: FeatureType::BankLine,
            data: CreditLineDisclosure::default(),
            updated_at: Utc::now(),
        };
        assert_eq!(agent.upsert(disclosed.clone()).await.unwrap(), "d-1");

        disclosed.static_id = "d-2".into();
        disclosed.data.appetite = Some(true);
        assert_eq!(agent.upsert(disclosed).await.unwrap(), "d-1");
        assert_eq!(agent.len(), 1);

        let stored = agent
            .find("bank-1", "buyer-1", &ProductContext::bank_line())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data.appetite, Some(true));

        assert!(agent.delete("bank-1", "buyer-1", &ProductContext::bank_line()).await.unwrap());
        assert!(!agent.delete("bank-1", "buyer-1", &ProductContext::bank_line()).await.unwrap());
    }
}
