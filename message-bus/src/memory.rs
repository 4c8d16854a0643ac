//! In-memory bus for tests and local runs

use crate::{
    message::{Acknowledger, ReceivedMessage},
    publisher::MessagePublisher,
    subscriber::{ConsumerWatchdog, MessageHandler},
    types::{Disposition, PublishOptions},
    Error, Result,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Message captured by [`InMemoryBus`]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    /// Routing key
    pub routing_key: String,
    /// JSON content
    pub content: Value,
    /// Publish options
    pub options: PublishOptions,
    /// Published through `publish_critical`
    pub critical: bool,
}

/// Shared record of dispositions applied to delivered messages
#[derive(Debug, Clone, Default)]
pub struct SettlementLog {
    dispositions: Arc<Mutex<Vec<Disposition>>>,
}

impl SettlementLog {
    /// Acknowledger appending to this log
    pub fn acknowledger(&self) -> RecordingAcknowledger {
        RecordingAcknowledger { log: self.clone() }
    }

    /// Dispositions in application order
    pub fn dispositions(&self) -> Vec<Disposition> {
        self.dispositions.lock().clone()
    }

    /// How many times `disposition` was applied
    pub fn count(&self, disposition: Disposition) -> usize {
        self.dispositions
            .lock()
            .iter()
            .filter(|d| **d == disposition)
            .count()
    }
}

/// Acknowledger that only records
#[derive(Debug, Clone)]
pub struct RecordingAcknowledger {
    log: SettlementLog,
}

#[async_trait]
impl Acknowledger for RecordingAcknowledger {
    async fn settle(&self, disposition: Disposition) -> Result<()> {
        self.log.dispositions.lock().push(disposition);
        Ok(())
    }
}

/// Bus that keeps everything in process memory
#[derive(Default)]
pub struct InMemoryBus {
    published: Mutex<Vec<PublishedMessage>>,
    handlers: Mutex<HashMap<String, Arc<dyn MessageHandler>>>,
    routing_keys: Mutex<HashMap<String, Vec<String>>>,
    failing_publishes: AtomicUsize,
    close_calls: AtomicUsize,
}

impl InMemoryBus {
    /// Create empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` publishes fail
    pub fn fail_next_publishes(&self, count: usize) {
        self.failing_publishes.store(count, Ordering::SeqCst);
    }

    /// Every message published so far
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().clone()
    }

    /// Forget published messages
    pub fn clear_published(&self) {
        self.published.lock().clear();
    }

    /// Routing keys registered by the listener on `publisher_id`
    pub fn listening_on(&self, publisher_id: &str) -> Option<Vec<String>> {
        self.routing_keys.lock().get(publisher_id).cloned()
    }

    /// Number of `close` calls
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Deliver one message to the handler listening on `publisher_id` and
    /// return the dispositions it applied
    pub async fn deliver(
        &self,
        publisher_id: &str,
        routing_key: &str,
        content: Value,
    ) -> Result<Vec<Disposition>> {
        let handler = self
            .handlers
            .lock()
            .get(publisher_id)
            .cloned()
            .ok_or_else(|| Error::Subscribe(format!("No consumer listening on {}", publisher_id)))?;

        let log = SettlementLog::default();
        let message = ReceivedMessage::new(routing_key, content, Box::new(log.acknowledger()));
        handler.handle(message).await;

        Ok(log.dispositions())
    }

    fn record(&self, routing_key: &str, content: &Value, options: PublishOptions, critical: bool) -> Result<()> {
        let should_fail = self
            .failing_publishes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(Error::Publish(format!("Injected failure publishing {}", routing_key)));
        }

        debug!("In-memory publish to {}", routing_key);
        self.published.lock().push(PublishedMessage {
            routing_key: routing_key.to_string(),
            content: content.clone(),
            options,
            critical,
        });
        Ok(())
    }
}

#[async_trait]
impl MessagePublisher for InMemoryBus {
    async fn publish(&self, routing_key: &str, content: &Value, options: PublishOptions) -> Result<()> {
        self.record(routing_key, content, options, false)
    }

    async fn publish_critical(
        &self,
        routing_key: &str,
        content: &Value,
        options: PublishOptions,
    ) -> Result<()> {
        self.record(routing_key, content, options, true)
    }
}

#[async_trait]
impl ConsumerWatchdog for InMemoryBus {
    async fn listen(
        &self,
        publisher_id: &str,
        routing_keys: &[String],
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()> {
        self.handlers.lock().insert(publisher_id.to_string(), handler);
        self.routing_keys
            .lock()
            .insert(publisher_id.to_string(), routing_keys.to_vec());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.handlers.lock().clear();
        self.routing_keys.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct AckEverything;

    #[async_trait]
    impl MessageHandler for AckEverything {
        async fn handle(&self, message: ReceivedMessage) {
            let _ = message.ack().await;
        }
    }

    #[tokio::test]
    async fn test_publish_is_recorded() {
        let bus = InMemoryBus::new();
        bus.publish_critical("KOMGO.Test", &json!({"a": 1}), PublishOptions::for_recipient("bank-1"))
            .await
            .unwrap();
        bus.publish("KOMGO.Other", &json!({}), PublishOptions::default())
            .await
            .unwrap();

        let published = bus.published();
        assert_eq!(published.len(), 2);
        assert!(published[0].critical);
        assert!(!published[1].critical);
        assert_eq!(published[0].options.recipient_static_id.as_deref(), Some("bank-1"));
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let bus = InMemoryBus::new();
        bus.fail_next_publishes(1);

        let first = bus.publish_critical("KOMGO.Test", &json!({}), PublishOptions::default()).await;
        let second = bus.publish_critical("KOMGO.Test", &json!({}), PublishOptions::default()).await;

        assert!(matches!(first, Err(Error::Publish(_))));
        assert!(second.is_ok());
        assert_eq!(bus.published().len(), 1);
    }

    #[tokio::test]
    async fn test_deliver_requires_listener() {
        let bus = InMemoryBus::new();
        let result = bus.deliver("from-event-mgnt", "KOMGO.Test", json!({})).await;
        assert!(matches!(result, Err(Error::Subscribe(_))));

        let keys = vec!["KOMGO.Test".to_string()];
        bus.listen("from-event-mgnt", &keys, Arc::new(AckEverything)).await.unwrap();
        assert_eq!(bus.listening_on("from-event-mgnt"), Some(keys));

        let dispositions = bus.deliver("from-event-mgnt", "KOMGO.Test", json!({})).await.unwrap();
        assert_eq!(dispositions, vec![Disposition::Ack]);

        bus.close().await.unwrap();
        assert_eq!(bus.close_calls(), 1);
        assert!(bus.listening_on("from-event-mgnt").is_none());
    }
}
