//! Inbound dispatcher
//!
//! Listens on the inbound publisher for the four message types and settles
//! every delivery exactly once: ack when processed, reject when it can never
//! succeed (unknown routing key, no processor, invalid payload), requeue on
//! anything else.

use super::{InboundMessage, ProcessingOutcome, ProcessorRegistry};
use crate::{
    messages::MessageType,
    metrics::{INBOUND_MESSAGES_TOTAL, PROCESSOR_DURATION},
    Result,
};
use async_trait::async_trait;
use message_bus::{ConsumerWatchdog, Disposition, MessageHandler, ReceivedMessage};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Stopped,
    Listening,
}

struct DispatchHandler {
    registry: Arc<ProcessorRegistry>,
}

impl DispatchHandler {
    async fn dispose(&self, message: &ReceivedMessage) -> (Disposition, &'static str) {
        if MessageType::from_routing_key(&message.routing_key).is_none() {
            warn!(routing_key = %message.routing_key, "❌ Unknown routing key, rejecting");
            return (Disposition::Reject, "unknown_routing_key");
        }

        let inbound = InboundMessage::parse(message.routing_key.clone(), message.content.clone());
        let Some(processor) = self.registry.find(&inbound) else {
            warn!(
                routing_key = %message.routing_key,
                feature_type = ?inbound.feature_type,
                "❌ No processor for message, rejecting"
            );
            return (Disposition::Reject, "unprocessed");
        };

        let started = Instant::now();
        let outcome = processor.process_message(&inbound).await;
        PROCESSOR_DURATION
            .with_label_values(&[processor.name()])
            .observe(started.elapsed().as_secs_f64());

        match &outcome {
            ProcessingOutcome::Processed(_) => {
                info!(processor = processor.name(), "✅ Message processed");
            }
            ProcessingOutcome::Rejected(reason) => {
                error!(processor = processor.name(), "❌ Invalid message, rejecting: {}", reason);
            }
            ProcessingOutcome::Retryable(reason) => {
                warn!(processor = processor.name(), "⚠️ Processing failed, requeueing: {}", reason);
            }
        }

        (outcome.disposition(), outcome.as_str())
    }
}

#[async_trait]
impl MessageHandler for DispatchHandler {
    async fn handle(&self, message: ReceivedMessage) {
        let (disposition, outcome) = self.dispose(&message).await;

        INBOUND_MESSAGES_TOTAL
            .with_label_values(&[message.routing_key.as_str(), outcome])
            .inc();

        let routing_key = message.routing_key.clone();
        if let Err(e) = message.settle(disposition).await {
            error!(routing_key = %routing_key, "Failed to {} message: {}", disposition.as_str(), e);
        }
    }
}

/// Consumer side of the service
pub struct MessageProcessorService {
    consumer: Arc<dyn ConsumerWatchdog>,
    inbound_publisher_id: String,
    registry: Arc<ProcessorRegistry>,
    state: Mutex<ConsumerState>,
}

impl MessageProcessorService {
    pub fn new(
        consumer: Arc<dyn ConsumerWatchdog>,
        inbound_publisher_id: impl Into<String>,
        registry: ProcessorRegistry,
    ) -> Self {
        Self {
            consumer,
            inbound_publisher_id: inbound_publisher_id.into(),
            registry: Arc::new(registry),
            state: Mutex::new(ConsumerState::Stopped),
        }
    }

    pub async fn state(&self) -> ConsumerState {
        *self.state.lock().await
    }

    /// Start listening; does nothing when already listening
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state == ConsumerState::Listening {
            return Ok(());
        }

        let handler = Arc::new(DispatchHandler {
            registry: self.registry.clone(),
        });
        self.consumer
            .listen(&self.inbound_publisher_id, &MessageType::routing_keys(), handler)
            .await?;

        *state = ConsumerState::Listening;
        info!(
            publisher = %self.inbound_publisher_id,
            processors = self.registry.len(),
            "✅ Message processor listening"
        );
        Ok(())
    }

    /// Close the consumer; in-flight messages finish first
    pub async fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state == ConsumerState::Stopped {
            return Ok(());
        }

        self.consumer.close().await?;
        *state = ConsumerState::Stopped;
        info!("Message processor stopped");
        Ok(())
    }
}
