//! Inbound dispatcher: every delivery is settled exactly once

use async_trait::async_trait;
use credit_lines::{
    data::{
        DisclosedCreditLineDataAgent, InMemoryCreditLineRequestDataAgent, InMemoryDepositLoanRequestDataAgent,
        InMemoryDisclosedDepositLoanDataAgent,
    },
    models::{DisclosedCreditLine, ProductContext},
    processing::{
        default_processors, ConsumerState, EventProcessor, InboundMessage, MessageProcessorService,
        ProcessingOutcome, ProcessorRegistry,
    },
    request_client::RequestClient,
    requests::{CreditLineRequestService, DepositLoanRequestService},
    Error,
};
use message_bus::{Disposition, InMemoryBus};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const INBOUND: &str = "from-event-mgnt";

/// Accepts everything and answers with a fixed result
struct ScriptedProcessor {
    result: fn() -> credit_lines::Result<bool>,
    calls: AtomicUsize,
}

impl ScriptedProcessor {
    fn new(result: fn() -> credit_lines::Result<bool>) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EventProcessor for ScriptedProcessor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn should_process(&self, _message: &InboundMessage) -> bool {
        true
    }

    async fn process_message(&self, _message: &InboundMessage) -> ProcessingOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ProcessingOutcome::from_result((self.result)())
    }
}

/// Storage that is always down
struct UnavailableStore;

#[async_trait]
impl DisclosedCreditLineDataAgent for UnavailableStore {
    async fn upsert(&self, _disclosed: DisclosedCreditLine) -> credit_lines::Result<String> {
        Err(Error::DataAgent("connection refused".into()))
    }

    async fn find(
        &self,
        _owner_static_id: &str,
        _counterparty_static_id: &str,
        _context: &ProductContext,
    ) -> credit_lines::Result<Option<DisclosedCreditLine>> {
        Err(Error::DataAgent("connection refused".into()))
    }

    async fn delete(
        &self,
        _owner_static_id: &str,
        _counterparty_static_id: &str,
        _context: &ProductContext,
    ) -> credit_lines::Result<bool> {
        Err(Error::DataAgent("connection refused".into()))
    }
}

async fn listening(bus: &Arc<InMemoryBus>, registry: ProcessorRegistry) -> MessageProcessorService {
    let service = MessageProcessorService::new(bus.clone(), INBOUND, registry);
    service.start().await.unwrap();
    service
}

fn default_registry(bus: &Arc<InMemoryBus>, disclosed: Arc<dyn DisclosedCreditLineDataAgent>) -> ProcessorRegistry {
    let client = Arc::new(RequestClient::new(bus.clone()));
    default_processors(
        "corp-1",
        disclosed,
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

fn share(recipient: &str) -> Value {
    json!({
        "version": 1,
        "messageType": "KOMGO.CreditLines.Share",
        "staticId": "scl-1",
        "ownerStaticId": "bank-1",
        "recepientStaticId": recipient,
        "featureType": "RiskCover",
        "payload": {
            "context": {"productId": "tradeFinance", "subProductId": "rd"},
            "counterpartyStaticId": "buyer-1",
            "data": {"appetite": false}
        }
    })
}

#[tokio::test]
async fn test_scenario_c_unknown_routing_key_is_rejected() {
    let bus = Arc::new(InMemoryBus::new());
    let processor = ScriptedProcessor::new(|| Ok(true));
    let _service = listening(&bus, ProcessorRegistry::new().register(processor.clone())).await;

    let dispositions = bus
        .deliver(INBOUND, "KOMGO.CreditLines.Unknown", share("corp-1"))
        .await
        .unwrap();

    assert_eq!(dispositions, vec![Disposition::Reject]);
    assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_scenario_d_generic_failure_is_requeued() {
    let bus = Arc::new(InMemoryBus::new());
    let processor = ScriptedProcessor::new(|| Err(Error::DataAgent("timeout".into())));
    let _service = listening(&bus, ProcessorRegistry::new().register(processor.clone())).await;

    let dispositions = bus
        .deliver(INBOUND, "KOMGO.CreditLines.Share", share("corp-1"))
        .await
        .unwrap();

    assert_eq!(dispositions, vec![Disposition::Requeue]);
    assert_eq!(processor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scenario_d_invalid_payload_is_rejected() {
    let bus = Arc::new(InMemoryBus::new());
    let processor = ScriptedProcessor::new(|| Err(Error::InvalidPayload("missing context".into())));
    let _service = listening(&bus, ProcessorRegistry::new().register(processor.clone())).await;

    let dispositions = bus
        .deliver(INBOUND, "KOMGO.CreditLines.Share", share("corp-1"))
        .await
        .unwrap();

    assert_eq!(dispositions, vec![Disposition::Reject]);
}

#[tokio::test]
async fn test_processed_message_is_acked() {
    let bus = Arc::new(InMemoryBus::new());
    let processor = ScriptedProcessor::new(|| Ok(false));
    let _service = listening(&bus, ProcessorRegistry::new().register(processor)).await;

    let dispositions = bus
        .deliver(INBOUND, "KOMGO.CreditLines.Revoke", json!({}))
        .await
        .unwrap();

    assert_eq!(dispositions, vec![Disposition::Ack]);
}

#[tokio::test]
async fn test_default_processors_settle_once() {
    let bus = Arc::new(InMemoryBus::new());
    let disclosed = Arc::new(credit_lines::data::InMemoryDisclosedCreditLineDataAgent::new());
    let _service = listening(&bus, default_registry(&bus, disclosed.clone())).await;

    let cases = vec![
        ("KOMGO.CreditLines.Share", share("corp-1"), Disposition::Ack),
        ("KOMGO.CreditLines.Share", share("corp-2"), Disposition::Reject),
        (
            "KOMGO.CreditLines.Share",
            json!({"messageType": "KOMGO.CreditLines.Share", "featureType": "BankLine"}),
            Disposition::Reject,
        ),
        (
            "KOMGO.CreditLines.Share",
            json!({"messageType": "KOMGO.CreditLines.Share", "featureType": "Bond"}),
            Disposition::Reject,
        ),
    ];

    for (routing_key, content, expected) in cases {
        let dispositions = bus.deliver(INBOUND, routing_key, content).await.unwrap();
        assert_eq!(dispositions, vec![expected]);
    }

    assert_eq!(disclosed.len(), 1);
}

#[tokio::test]
async fn test_store_outage_is_requeued() {
    let bus = Arc::new(InMemoryBus::new());
    let _service = listening(&bus, default_registry(&bus, Arc::new(UnavailableStore))).await;

    let dispositions = bus
        .deliver(INBOUND, "KOMGO.CreditLines.Share", share("corp-1"))
        .await
        .unwrap();

    assert_eq!(dispositions, vec![Disposition::Requeue]);
}

#[tokio::test]
async fn test_stop_closes_consumer() {
    let bus = Arc::new(InMemoryBus::new());
    let service = listening(&bus, ProcessorRegistry::new()).await;
    assert_eq!(service.state().await, ConsumerState::Listening);

    service.stop().await.unwrap();

    assert_eq!(service.state().await, ConsumerState::Stopped);
    assert_eq!(bus.close_calls(), 1);
    assert!(bus.listening_on(INBOUND).is_none());

    service.start().await.unwrap();
    assert!(bus.listening_on(INBOUND).is_some());
}
