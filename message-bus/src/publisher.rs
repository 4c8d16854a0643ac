//! Message publisher with retry logic

use crate::{
    client::NatsClient,
    metrics::{MESSAGE_PUBLISH_DURATION, MESSAGE_PUBLISH_TOTAL},
    types::{stream_name_for, subject_for, wildcard_subject, PublishOptions, MESSAGE_ID_HEADER, RECIPIENT_HEADER},
    Error, Result,
};
use async_nats::HeaderMap;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outbound side of the bus
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Fire a message once, without broker acknowledgement or retry
    async fn publish(&self, routing_key: &str, content: &Value, options: PublishOptions) -> Result<()>;

    /// Publish and wait until the broker has persisted the message,
    /// retrying internally before giving up
    async fn publish_critical(
        &self,
        routing_key: &str,
        content: &Value,
        options: PublishOptions,
    ) -> Result<()>;
}

/// Publisher configuration
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Timeout waiting for the broker acknowledgement
    pub publish_timeout: Duration,

    /// Max retry attempts
    pub max_retry_attempts: u32,

    /// Initial retry delay
    pub initial_retry_delay: Duration,

    /// Max retry delay
    pub max_retry_delay: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            publish_timeout: Duration::from_secs(5),
            max_retry_attempts: 3,
            initial_retry_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_secs(2),
        }
    }
}

/// JetStream-backed publisher for one publisher id
pub struct JetStreamPublisher {
    client: Arc<NatsClient>,
    publisher_id: String,
    config: PublisherConfig,
    stream_ready: OnceCell<()>,
}

impl JetStreamPublisher {
    /// Create new publisher
    pub fn new(client: Arc<NatsClient>, publisher_id: impl Into<String>, config: PublisherConfig) -> Self {
        Self {
            client,
            publisher_id: publisher_id.into(),
            config,
            stream_ready: OnceCell::new(),
        }
    }

    /// Publisher id messages are sent under
    pub fn publisher_id(&self) -> &str {
        &self.publisher_id
    }

    fn headers(options: &PublishOptions, message_id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(MESSAGE_ID_HEADER, message_id);
        if let Some(recipient) = options.recipient_static_id.as_deref() {
            headers.insert(RECIPIENT_HEADER, recipient);
        }
        headers
    }

    async fn ensure_stream(&self) -> Result<()> {
        self.stream_ready
            .get_or_try_init(|| async {
                self.client
                    .get_or_create_stream(
                        &stream_name_for(&self.publisher_id),
                        vec![wildcard_subject(&self.publisher_id)],
                    )
                    .await
                    .map(|_| ())
            })
            .await?;
        Ok(())
    }

    /// Publish with exponential backoff retry
    async fn publish_with_retry(&self, subject: &str, payload: Bytes, headers: HeaderMap) -> Result<()> {
        let mut attempts = 0;
        let mut delay = self.config.initial_retry_delay;

        loop {
            attempts += 1;

            match self.publish_once(subject, payload.clone(), headers.clone()).await {
                Ok(_) => {
                    if attempts > 1 {
                        info!("✅ Message published after {} attempts", attempts);
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempts >= self.config.max_retry_attempts {
                        error!("❌ Failed to publish after {} attempts: {}", attempts, e);
                        return Err(e);
                    }

                    warn!(
                        "⚠️  Publish failed (attempt {}), retrying in {:?}: {}",
                        attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;

                    delay = (delay * 2).min(self.config.max_retry_delay);
                }
            }
        }
    }

    /// Single JetStream publish attempt
    async fn publish_once(&self, subject: &str, payload: Bytes, headers: HeaderMap) -> Result<()> {
        self.ensure_stream().await?;
        let js = self.client.jetstream().await?;

        let ack = js
            .publish_with_headers(subject.to_string(), headers, payload)
            .await
            .map_err(|e| Error::Publish(e.to_string()))?;

        tokio::time::timeout(self.config.publish_timeout, ack)
            .await
            .map_err(|_| Error::Timeout(self.config.publish_timeout.as_millis() as u64))?
            .map_err(|e| Error::Publish(format!("Publish ack failed: {}", e)))?;

        Ok(())
    }

    fn record(routing_key: &str, start: Instant, result: &Result<()>) {
        MESSAGE_PUBLISH_DURATION
            .with_label_values(&[routing_key])
            .observe(start.elapsed().as_secs_f64());

        let status = if result.is_ok() { "success" } else { "error" };
        MESSAGE_PUBLISH_TOTAL
            .with_label_values(&[routing_key, status])
            .inc();
    }
}

#[async_trait]
impl MessagePublisher for JetStreamPublisher {
    async fn publish(&self, routing_key: &str, content: &Value, options: PublishOptions) -> Result<()> {
        let start = Instant::now();
        let subject = subject_for(&self.publisher_id, routing_key);
        let payload = Bytes::from(serde_json::to_vec(content)?);
        let message_id = options
            .message_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let result = async {
            let client = self.client.client().await?;
            client
                .publish_with_headers(subject.clone(), Self::headers(&options, &message_id), payload)
                .await
                .map_err(|e| Error::Publish(e.to_string()))?;

            client
                .flush()
                .await
                .map_err(|e| Error::Publish(format!("Flush failed: {}", e)))
        }
        .await;

        Self::record(routing_key, start, &result);
        result
    }

    async fn publish_critical(
        &self,
        routing_key: &str,
        content: &Value,
        options: PublishOptions,
    ) -> Result<()> {
        let start = Instant::now();
        let subject = subject_for(&self.publisher_id, routing_key);
        // One id for every attempt so broker-side dedup collapses retries.
        let message_id = options
            .message_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(
            message_id = %message_id,
            recipient = ?options.recipient_static_id,
            "Publishing message to subject: {}", subject
        );

        let payload = Bytes::from(serde_json::to_vec(content)?);
        let result = self
            .publish_with_retry(&subject, payload, Self::headers(&options, &message_id))
            .await;

        Self::record(routing_key, start, &result);
        result
    }
}
