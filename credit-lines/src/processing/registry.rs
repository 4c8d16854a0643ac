//! Ordered processor registry

use super::{
    CreditLineRequestDeclinedProcessor, CreditLineRequestProcessor, DepositLoanRequestDeclinedProcessor,
    DepositLoanRequestProcessor, EventProcessor, InboundMessage, RevokeCreditLineProcessor,
    RevokeDepositLoanProcessor, ShareCreditLineProcessor, ShareDepositLoanProcessor,
};
use crate::{
    data::{DisclosedCreditLineDataAgent, DisclosedDepositLoanDataAgent},
    requests::{CreditLineRequestService, DepositLoanRequestService},
};
use std::sync::Arc;
use tracing::warn;

/// Processors evaluated in registration order
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: Vec<Arc<dyn EventProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, processor: Arc<dyn EventProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Every processor accepting `message`
    pub fn matching(&self, message: &InboundMessage) -> Vec<&Arc<dyn EventProcessor>> {
        self.processors
            .iter()
            .filter(|p| p.should_process(message))
            .collect()
    }

    /// First processor accepting `message`. More than one match is a
    /// registration defect; it is logged and the first one still wins.
    pub fn find(&self, message: &InboundMessage) -> Option<Arc<dyn EventProcessor>> {
        let matching = self.matching(message);
        if matching.len() > 1 {
            let names: Vec<&str> = matching.iter().map(|p| p.name()).collect();
            warn!(
                routing_key = %message.routing_key,
                processors = ?names,
                "⚠️ Several processors match one message, using the first"
            );
        }
        matching.first().map(|p| Arc::clone(*p))
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

/// The eight processors of the service, credit lines first
pub fn default_processors(
    company_static_id: &str,
    disclosed_credit_lines: Arc<dyn DisclosedCreditLineDataAgent>,
    disclosed_deposit_loans: Arc<dyn DisclosedDepositLoanDataAgent>,
    credit_line_requests: Arc<CreditLineRequestService>,
    deposit_loan_requests: Arc<DepositLoanRequestService>,
) -> ProcessorRegistry {
    ProcessorRegistry::new()
        .register(Arc::new(ShareCreditLineProcessor::new(
            company_static_id,
            disclosed_credit_lines.clone(),
            credit_line_requests.clone(),
        )))
        .register(Arc::new(RevokeCreditLineProcessor::new(
            company_static_id,
            disclosed_credit_lines,
        )))
        .register(Arc::new(CreditLineRequestProcessor::new(
            company_static_id,
            credit_line_requests.clone(),
        )))
        .register(Arc::new(CreditLineRequestDeclinedProcessor::new(
            company_static_id,
            credit_line_requests,
        )))
        .register(Arc::new(ShareDepositLoanProcessor::new(
            company_static_id,
            disclosed_deposit_loans.clone(),
            deposit_loan_requests.clone(),
        )))
        .register(Arc::new(RevokeDepositLoanProcessor::new(
            company_static_id,
            disclosed_deposit_loans,
        )))
        .register(Arc::new(DepositLoanRequestProcessor::new(
            company_static_id,
            deposit_loan_requests.clone(),
        )))
        .register(Arc::new(DepositLoanRequestDeclinedProcessor::new(
            company_static_id,
            deposit_loan_requests,
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        InMemoryCreditLineRequestDataAgent, InMemoryDepositLoanRequestDataAgent,
        InMemoryDisclosedCreditLineDataAgent, InMemoryDisclosedDepositLoanDataAgent,
    };
    use crate::messages::MessageType;
    use crate::models::FeatureType;
    use crate::processing::ProcessingOutcome;
    use crate::request_client::RequestClient;
    use async_trait::async_trait;
    use message_bus::InMemoryBus;
    use serde_json::json;

    fn registry() -> ProcessorRegistry {
        let client = Arc::new(RequestClient::new(Arc::new(InMemoryBus::new())));
        default_processors(
            "corp-1",
            Arc::new(InMemoryDisclosedCreditLineDataAgent::new()),
            Arc::new(InMemoryDisclosedDepositLoanDataAgent::new()),
            Arc::new(CreditLineRequestService::new(
                "corp-1",
                Arc::new(InMemoryCreditLineRequestDataAgent::new()),
                client.clone(),
            )),
            Arc::new(DepositLoanRequestService::new(
                "corp-1",
                Arc::new(InMemoryDepositLoanRequestDataAgent::new()),
                client,
            )),
        )
    }

    #[test]
    fn test_default_predicates_are_mutually_exclusive() {
        let registry = registry();
        assert_eq!(registry.len(), 8);

        let features = [
            FeatureType::BankLine,
            FeatureType::RiskCover,
            FeatureType::Deposit,
            FeatureType::Loan,
        ];
        for message_type in MessageType::ALL {
            for feature_type in features {
                let message = InboundMessage::parse(
                    message_type.routing_key(),
                    json!({"messageType": message_type, "featureType": feature_type}),
                );
                assert_eq!(
                    registry.matching(&message).len(),
                    1,
                    "{} / {}",
                    message_type,
                    feature_type
                );
            }
        }
    }

    #[test]
    fn test_no_match_without_feature_type() {
        let registry = registry();
        let message = InboundMessage::parse(
            "KOMGO.CreditLines.Share",
            json!({"messageType": "KOMGO.CreditLines.Share"}),
        );
        assert!(registry.find(&message).is_none());
    }

    struct Named(&'static str);

    #[async_trait]
    impl EventProcessor for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn should_process(&self, _message: &InboundMessage) -> bool {
            true
        }

        async fn process_message(&self, _message: &InboundMessage) -> ProcessingOutcome {
            ProcessingOutcome::Processed(false)
        }
    }

    #[test]
    fn test_overlap_takes_first_registered() {
        let registry = ProcessorRegistry::new()
            .register(Arc::new(Named("first")))
            .register(Arc::new(Named("second")));
        let message = InboundMessage::parse("KOMGO.CreditLines.Share", json!({}));

        assert_eq!(registry.matching(&message).len(), 2);
        assert_eq!(registry.find(&message).map(|p| p.name()), Some("first"));
    }
}
