//! Diff engine against the in-memory bus and data agents

use async_trait::async_trait;
use credit_lines::{
    data::{
        DisclosedCreditLineDataAgent, InMemoryCreditLineRequestDataAgent, InMemoryDepositLoanRequestDataAgent,
        InMemoryDisclosedCreditLineDataAgent, InMemoryDisclosedDepositLoanDataAgent,
    },
    messages::{MessageType, SharedCreditLineMessage},
    models::{
        CreditLine, CreditLineDisclosure, CreditLineRequest, CreditLineSharingOptions, Currency, DepositLoan,
        DepositLoanPeriod, DepositLoanType, InformationShared, ProductContext, RequestType,
        SharedCreditLine, SharedDepositLoan, SharedPricing,
    },
    processing::{default_processors, MessageProcessorService},
    request_client::RequestClient,
    requests::{CreditLineRequestService, DepositLoanRequestService},
    sharing::{
        credit_line_flavor, deposit_loan_flavor, CreditLineRequestKey, PendingRequestCorrelator,
        ShareCreditLineService, ShareDecision, ShareDepositLoanService,
    },
    Error,
};
use message_bus::{Disposition, InMemoryBus};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Correlator with at most one pending request
#[derive(Default)]
struct CountingCorrelator {
    pending: Mutex<Option<String>>,
    lookups: AtomicUsize,
    completed: AtomicUsize,
}

impl CountingCorrelator {
    fn with_pending(request_id: &str) -> Self {
        let correlator = Self::default();
        *correlator.pending.lock().unwrap() = Some(request_id.to_string());
        correlator
    }
}

#[async_trait]
impl PendingRequestCorrelator for CountingCorrelator {
    type Key = CreditLineRequestKey;
    type Request = String;

    async fn get_pending_request(&self, _key: &CreditLineRequestKey) -> credit_lines::Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn mark_completed(&self, _request: String) -> credit_lines::Result<()> {
        self.completed.fetch_add(1, Ordering::SeqCst);
        *self.pending.lock().unwrap() = None;
        Ok(())
    }
}

fn credit_line() -> CreditLine {
    CreditLine {
        static_id: "cl-1".into(),
        counterparty_static_id: "buyer-1".into(),
        context: ProductContext::bank_line(),
        appetite: Some(true),
        currency: Currency::EUR,
        availability: None,
        availability_amount: Some(dec!(1000)),
        credit_limit: None,
        fee: None,
        maximum_tenor: None,
        margin: None,
    }
}

fn shared_with(company: &str, options: CreditLineSharingOptions) -> SharedCreditLine {
    SharedCreditLine {
        static_id: format!("shared-{}", company),
        credit_line_static_id: "cl-1".into(),
        counterparty_static_id: "buyer-1".into(),
        shared_with_static_id: company.into(),
        data: options,
    }
}

fn scenario_a_options() -> CreditLineSharingOptions {
    CreditLineSharingOptions {
        appetite: InformationShared::SHARED,
        availability: InformationShared::SHARED,
        availability_amount: InformationShared::SHARED,
        ..Default::default()
    }
}

fn engine<C: PendingRequestCorrelator<Key = CreditLineRequestKey>>(
    bus: &Arc<InMemoryBus>,
    correlator: Arc<C>,
) -> ShareCreditLineService<C> {
    ShareCreditLineService::new(
        credit_line_flavor(),
        "bank-1",
        Arc::new(RequestClient::new(bus.clone())),
        correlator,
    )
}

#[tokio::test]
async fn test_scenario_a_first_share() {
    let bus = Arc::new(InMemoryBus::new());
    let service = engine(&bus, Arc::new(CountingCorrelator::default()));
    let config = shared_with("corp-1", scenario_a_options());
    let record = credit_line();

    let decision = service.process(Some(&config), None, Some(&record), None).await.unwrap();
    assert_eq!(decision, ShareDecision::Shared { forced: false });

    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].routing_key, MessageType::Share.routing_key());
    assert!(published[0].critical);
    assert_eq!(published[0].options.recipient_static_id.as_deref(), Some("corp-1"));

    let message: SharedCreditLineMessage = serde_json::from_value(published[0].content.clone()).unwrap();
    assert_eq!(message.owner_static_id, "bank-1");
    assert_eq!(message.recepient_static_id, "corp-1");
    assert_eq!(
        message.payload.data,
        CreditLineDisclosure {
            appetite: Some(true),
            availability: Some(true),
            availability_amount: Some(dec!(1000)),
            currency: Some(Currency::EUR),
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn test_scenario_b_closing_gate_revokes() {
    let bus = Arc::new(InMemoryBus::new());
    let service = engine(&bus, Arc::new(CountingCorrelator::default()));
    let old_config = shared_with("corp-1", scenario_a_options());
    let new_config = shared_with(
        "corp-1",
        CreditLineSharingOptions {
            appetite: InformationShared::HIDDEN,
            ..Default::default()
        },
    );
    let record = credit_line();

    let decision = service
        .process(Some(&new_config), Some(&old_config), Some(&record), Some(&record))
        .await
        .unwrap();
    assert_eq!(decision, ShareDecision::Revoked);

    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].routing_key, MessageType::Revoke.routing_key());
    assert_eq!(published[0].options.recipient_static_id.as_deref(), Some("corp-1"));
    assert_eq!(
        published[0].content["payload"],
        json!({
            "context": {"productId": "tradeFinance", "subProductId": "mbl"},
            "counterpartyStaticId": "buyer-1"
        })
    );
}

#[tokio::test]
async fn test_identical_snapshots_send_nothing() {
    let bus = Arc::new(InMemoryBus::new());
    let correlator = Arc::new(CountingCorrelator::default());
    let service = engine(&bus, correlator.clone());
    let config = shared_with("corp-1", scenario_a_options());
    let record = credit_line();

    let decision = service
        .process(Some(&config), Some(&config), Some(&record), Some(&record))
        .await
        .unwrap();

    assert_eq!(decision, ShareDecision::NoOp);
    assert!(bus.published().is_empty());
    assert_eq!(correlator.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_pending_request_forces_share() {
    let bus = Arc::new(InMemoryBus::new());
    let correlator = Arc::new(CountingCorrelator::with_pending("request-1"));
    let service = engine(&bus, correlator.clone());
    let config = shared_with("corp-1", scenario_a_options());
    let record = credit_line();

    let decision = service
        .process(Some(&config), Some(&config), Some(&record), Some(&record))
        .await
        .unwrap();
    assert_eq!(decision, ShareDecision::Shared { forced: true });
    assert_eq!(bus.published().len(), 1);
    assert_eq!(correlator.completed.load(Ordering::SeqCst), 1);

    let again = service
        .process(Some(&config), Some(&config), Some(&record), Some(&record))
        .await
        .unwrap();
    assert_eq!(again, ShareDecision::NoOp);
    assert_eq!(bus.published().len(), 1);
    assert_eq!(correlator.completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_publish_failure_surfaces_and_keeps_request_pending() {
    let bus = Arc::new(InMemoryBus::new());
    let correlator = Arc::new(CountingCorrelator::with_pending("request-1"));
    let service = engine(&bus, correlator.clone());
    let config = shared_with("corp-1", scenario_a_options());
    let record = credit_line();

    bus.fail_next_publishes(1);
    let result = service.process(Some(&config), None, Some(&record), None).await;

    assert!(matches!(result, Err(Error::MessageSending(_))));
    assert_eq!(correlator.completed.load(Ordering::SeqCst), 0);
    assert!(correlator.pending.lock().unwrap().is_some());
}

#[tokio::test]
async fn test_received_request_is_disclosed_by_share() {
    let bus = Arc::new(InMemoryBus::new());
    let requests = Arc::new(CreditLineRequestService::new(
        "bank-1",
        Arc::new(InMemoryCreditLineRequestDataAgent::new()),
        Arc::new(RequestClient::new(bus.clone())),
    ));
    requests
        .request_received(CreditLineRequest::new(
            RequestType::Received,
            "corp-1",
            "buyer-1",
            ProductContext::bank_line(),
            None,
        ))
        .await
        .unwrap();

    let service = engine(&bus, requests.clone());
    let config = shared_with("corp-1", scenario_a_options());
    let record = credit_line();

    let decision = service
        .process(Some(&config), Some(&config), Some(&record), Some(&record))
        .await
        .unwrap();

    assert_eq!(decision, ShareDecision::Shared { forced: true });
    assert!(requests
        .get_pending_request("corp-1", "buyer-1", &ProductContext::bank_line())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_deleted_record_revokes() {
    let bus = Arc::new(InMemoryBus::new());
    let service = engine(&bus, Arc::new(CountingCorrelator::default()));
    let config = shared_with("corp-1", scenario_a_options());
    let record = credit_line();

    let decision = service
        .process(Some(&config), Some(&config), None, Some(&record))
        .await
        .unwrap();

    assert_eq!(decision, ShareDecision::Revoked);
    assert_eq!(bus.published()[0].routing_key, MessageType::Revoke.routing_key());
}

#[tokio::test]
async fn test_process_all_pairs_configurations_by_recipient() {
    let bus = Arc::new(InMemoryBus::new());
    let service = engine(&bus, Arc::new(CountingCorrelator::default()));
    let record = credit_line();

    let old_configs = vec![
        shared_with("corp-1", scenario_a_options()),
        shared_with("corp-2", scenario_a_options()),
    ];
    let new_configs = vec![
        shared_with("corp-1", scenario_a_options()),
        shared_with("corp-3", scenario_a_options()),
    ];

    let decisions = service
        .process_all(&new_configs, &old_configs, Some(&record), Some(&record))
        .await
        .unwrap();

    assert_eq!(
        decisions,
        vec![
            ShareDecision::NoOp,
            ShareDecision::Shared { forced: false },
            ShareDecision::Revoked,
        ]
    );

    let recipients: Vec<Option<String>> = bus
        .published()
        .into_iter()
        .map(|m| m.options.recipient_static_id)
        .collect();
    assert_eq!(recipients, vec![Some("corp-3".to_string()), Some("corp-2".to_string())]);
}

#[tokio::test]
async fn test_deposit_loan_share_then_revoke() {
    let bus = Arc::new(InMemoryBus::new());
    let requests = Arc::new(DepositLoanRequestService::new(
        "bank-1",
        Arc::new(InMemoryDepositLoanRequestDataAgent::new()),
        Arc::new(RequestClient::new(bus.clone())),
    ));
    let service: ShareDepositLoanService<DepositLoanRequestService> = ShareDepositLoanService::new(
        deposit_loan_flavor(),
        "bank-1",
        Arc::new(RequestClient::new(bus.clone())),
        requests,
    );

    let record = DepositLoan {
        static_id: "dl-1".into(),
        kind: DepositLoanType::Deposit,
        currency: Currency::GBP,
        period: DepositLoanPeriod::Years,
        period_duration: Some(1),
        appetite: Some(true),
        pricing: Some(dec!(0.75)),
    };
    let open = SharedDepositLoan {
        static_id: "sdl-1".into(),
        deposit_loan_static_id: "dl-1".into(),
        shared_with_static_id: "corp-1".into(),
        appetite: InformationShared::SHARED,
        pricing: SharedPricing {
            shared: true,
            pricing: None,
        },
    };
    let closed = SharedDepositLoan {
        appetite: InformationShared::HIDDEN,
        ..open.clone()
    };

    let shared = service.process(Some(&open), None, Some(&record), None).await.unwrap();
    let revoked = service
        .process(Some(&closed), Some(&open), Some(&record), Some(&record))
        .await
        .unwrap();

    assert_eq!(shared, ShareDecision::Shared { forced: false });
    assert_eq!(revoked, ShareDecision::Revoked);

    let published = bus.published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].content["featureType"], json!("Deposit"));
    assert_eq!(
        published[1].content["payload"],
        json!({"type": "Deposit", "currency": "GBP", "period": "Years", "periodDuration": 1})
    );
}

#[tokio::test]
async fn test_share_reaches_recipient_store() {
    let owner_bus = Arc::new(InMemoryBus::new());
    let service = engine(&owner_bus, Arc::new(CountingCorrelator::default()));
    let config = shared_with("corp-1", scenario_a_options());
    let record = credit_line();
    service.process(Some(&config), None, Some(&record), None).await.unwrap();

    let recipient_bus = Arc::new(InMemoryBus::new());
    let client = Arc::new(RequestClient::new(recipient_bus.clone()));
    let disclosed = Arc::new(InMemoryDisclosedCreditLineDataAgent::new());
    let registry = default_processors(
        "corp-1",
        disclosed.clone(),
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
    );
    let processor = MessageProcessorService::new(recipient_bus.clone(), "from-event-mgnt", registry);
    processor.start().await.unwrap();

    let sent = owner_bus.published().remove(0);
    let dispositions = recipient_bus
        .deliver("from-event-mgnt", &sent.routing_key, sent.content)
        .await
        .unwrap();
    assert_eq!(dispositions, vec![Disposition::Ack]);

    let stored = disclosed
        .find("bank-1", "buyer-1", &ProductContext::bank_line())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.data.availability, Some(true));
    assert_eq!(stored.data.availability_amount, Some(dec!(1000)));
    assert_eq!(stored.data.credit_limit, None);
}
