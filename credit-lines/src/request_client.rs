//! Outbound dispatcher

use crate::{
    messages::{MessageType, OutboundMessage},
    Error, Result,
};
use message_bus::{MessagePublisher, PublishOptions};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Sends messages to other companies through the critical publish path.
///
/// Retrying is the publisher's job; a failure here is final and surfaces as
/// [`Error::MessageSending`].
pub struct RequestClient {
    publisher: Arc<dyn MessagePublisher>,
}

impl RequestClient {
    pub fn new(publisher: Arc<dyn MessagePublisher>) -> Self {
        Self { publisher }
    }

    /// Publish `payload` under `message_type`, addressed to `recipient_static_id`
    pub async fn send_common_request<T>(
        &self,
        message_type: MessageType,
        recipient_static_id: &str,
        payload: &T,
    ) -> Result<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        let content = serde_json::to_value(payload)?;

        info!(
            message_type = %message_type,
            recipient = recipient_static_id,
            "Sending message"
        );

        self.publisher
            .publish_critical(
                message_type.routing_key(),
                &content,
                PublishOptions::for_recipient(recipient_static_id),
            )
            .await
            .map_err(|e| {
                error!(
                    message_type = %message_type,
                    recipient = recipient_static_id,
                    "Failed to send message: {}", e
                );
                Error::MessageSending(e.to_string())
            })
    }

    pub async fn send(&self, message: &OutboundMessage) -> Result<()> {
        self.send_common_request(message.message_type, &message.recipient_static_id, &message.payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use message_bus::InMemoryBus;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_common_request_publishes_critical() {
        let bus = Arc::new(InMemoryBus::new());
        let client = RequestClient::new(bus.clone());

        client
            .send_common_request(MessageType::Request, "bank-1", &json!({"version": 1}))
            .await
            .unwrap();

        let published = bus.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].routing_key, "KOMGO.CreditLines.Request");
        assert_eq!(published[0].options.recipient_static_id.as_deref(), Some("bank-1"));
        assert!(published[0].critical);
    }

    #[tokio::test]
    async fn test_publish_failure_maps_to_message_sending() {
        let bus = Arc::new(InMemoryBus::new());
        bus.fail_next_publishes(1);
        let client = RequestClient::new(bus.clone());

        let result = client
            .send_common_request(MessageType::Share, "bank-1", &json!({}))
            .await;

        match result {
            Err(Error::MessageSending(reason)) => assert!(reason.contains("KOMGO.CreditLines.Share")),
            other => panic!("expected MessageSending, got {:?}", other),
        }
        assert!(bus.published().is_empty());
    }
}
