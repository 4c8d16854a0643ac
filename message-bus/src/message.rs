//! Delivered message with one-shot settlement
//!
//! A [`ReceivedMessage`] owns the handle that acknowledges it to the broker.
//! `ack`, `reject`, `requeue` and `settle` all consume the message, so a
//! second settlement of the same delivery does not compile.

use crate::{metrics::MESSAGE_SETTLE_TOTAL, types::Disposition, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Broker-side handle that applies a disposition to one delivery
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Apply the disposition
    async fn settle(&self, disposition: Disposition) -> Result<()>;
}

/// Message delivered by a consumer
pub struct ReceivedMessage {
    /// Routing key the message was published with
    pub routing_key: String,

    /// Decoded JSON content
    pub content: Value,

    /// Broker-assigned identifier, when known
    pub message_id: Option<String>,

    /// How many times the broker has delivered this message
    pub delivery_count: u64,

    /// Receive timestamp
    pub received_at: DateTime<Utc>,

    acker: Box<dyn Acknowledger>,
    settled: bool,
}

impl ReceivedMessage {
    /// Wrap delivered content with its acknowledger
    pub fn new(
        routing_key: impl Into<String>,
        content: Value,
        acker: Box<dyn Acknowledger>,
    ) -> Self {
        Self {
            routing_key: routing_key.into(),
            content,
            message_id: None,
            delivery_count: 1,
            received_at: Utc::now(),
            acker,
            settled: false,
        }
    }

    /// Set broker message id
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Set delivery count
    pub fn with_delivery_count(mut self, delivery_count: u64) -> Self {
        self.delivery_count = delivery_count;
        self
    }

    /// Decode the content into a typed message
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.content.clone())?)
    }

    /// Acknowledge successful processing
    pub async fn ack(self) -> Result<()> {
        self.settle(Disposition::Ack).await
    }

    /// Drop permanently
    pub async fn reject(self) -> Result<()> {
        self.settle(Disposition::Reject).await
    }

    /// Return to the queue for redelivery
    pub async fn requeue(self) -> Result<()> {
        self.settle(Disposition::Requeue).await
    }

    /// Apply exactly one disposition to this delivery
    pub async fn settle(mut self, disposition: Disposition) -> Result<()> {
        self.settled = true;
        debug!(
            routing_key = %self.routing_key,
            disposition = disposition.as_str(),
            "Settling message"
        );

        MESSAGE_SETTLE_TOTAL
            .with_label_values(&[disposition.as_str()])
            .inc();

        self.acker.settle(disposition).await
    }
}

impl fmt::Debug for ReceivedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceivedMessage")
            .field("routing_key", &self.routing_key)
            .field("message_id", &self.message_id)
            .field("delivery_count", &self.delivery_count)
            .field("received_at", &self.received_at)
            .finish_non_exhaustive()
    }
}

impl Drop for ReceivedMessage {
    fn drop(&mut self) {
        if !self.settled {
            warn!(
                routing_key = %self.routing_key,
                message_id = ?self.message_id,
                "Message dropped without ack, reject or requeue; broker will redeliver"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SettlementLog;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: u32,
    }

    #[tokio::test]
    async fn test_settle_records_single_disposition() {
        let log = SettlementLog::default();
        let message = ReceivedMessage::new("KOMGO.Test", json!({}), Box::new(log.acknowledger()));

        message.requeue().await.unwrap();

        assert_eq!(log.dispositions(), vec![Disposition::Requeue]);
    }

    #[tokio::test]
    async fn test_decode_content() {
        let log = SettlementLog::default();
        let message = ReceivedMessage::new("KOMGO.Test", json!({"value": 7}), Box::new(log.acknowledger()))
            .with_message_id("STREAM:1")
            .with_delivery_count(2);

        let probe: Probe = message.decode().unwrap();
        assert_eq!(probe.value, 7);
        assert_eq!(message.delivery_count, 2);
        assert!(message.decode::<Vec<u32>>().is_err());

        message.ack().await.unwrap();
        assert_eq!(log.count(Disposition::Ack), 1);
    }

    #[tokio::test]
    async fn test_unsettled_drop_does_not_settle() {
        let log = SettlementLog::default();
        let message = ReceivedMessage::new("KOMGO.Test", json!({}), Box::new(log.acknowledger()));
        drop(message);

        assert!(log.dispositions().is_empty());
    }
}
