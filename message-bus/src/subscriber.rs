//! Durable consumers ("consumer watchdog")

use crate::{
    client::NatsClient,
    message::{Acknowledger, ReceivedMessage},
    metrics::MESSAGE_RECEIVE_TOTAL,
    types::{routing_key_from_subject, stream_name_for, wildcard_subject, Disposition},
    Error, Result,
};
use async_nats::jetstream::{self, consumer};
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Message handler trait
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one delivered message; the handler owns its settlement
    async fn handle(&self, message: ReceivedMessage);
}

/// Inbound side of the bus
#[async_trait]
pub trait ConsumerWatchdog: Send + Sync {
    /// Start delivering messages published under `publisher_id` to `handler`
    async fn listen(
        &self,
        publisher_id: &str,
        routing_keys: &[String],
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()>;

    /// Stop all listeners; in-flight deliveries finish first
    async fn close(&self) -> Result<()>;
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Durable consumer name
    pub durable_name: String,

    /// Acknowledgment wait time
    pub ack_wait: Duration,

    /// Max delivery attempts
    pub max_deliver: i64,

    /// Delay before a requeued message is redelivered
    pub requeue_delay: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            durable_name: "api-credit-lines".to_string(),
            ack_wait: Duration::from_secs(30),
            max_deliver: 3,
            requeue_delay: Duration::from_millis(300),
        }
    }
}

struct Listener {
    publisher_id: String,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// JetStream pull consumer, one task per listened publisher id
pub struct JetStreamConsumer {
    client: Arc<NatsClient>,
    config: SubscriberConfig,
    listeners: Mutex<Vec<Listener>>,
}

impl JetStreamConsumer {
    /// Create new consumer
    pub fn new(client: Arc<NatsClient>, config: SubscriberConfig) -> Self {
        Self {
            client,
            config,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Number of running listeners
    pub fn active_listeners(&self) -> usize {
        self.listeners.lock().len()
    }
}

struct JetStreamAcknowledger {
    message: jetstream::Message,
    requeue_delay: Duration,
}

#[async_trait]
impl Acknowledger for JetStreamAcknowledger {
    async fn settle(&self, disposition: Disposition) -> Result<()> {
        let result = match disposition {
            Disposition::Ack => self.message.ack().await,
            Disposition::Reject => self.message.ack_with(jetstream::AckKind::Term).await,
            Disposition::Requeue => {
                self.message
                    .ack_with(jetstream::AckKind::Nak(Some(self.requeue_delay)))
                    .await
            }
        };

        result.map_err(|e| {
            error!("Failed to {} message: {}", disposition.as_str(), e);
            Error::Acknowledge(e.to_string())
        })
    }
}

async fn deliver(
    publisher_id: &str,
    routing_keys: &[String],
    msg: jetstream::Message,
    handler: &dyn MessageHandler,
    requeue_delay: Duration,
) {
    let subject: &str = &msg.subject;
    let routing_key = match routing_key_from_subject(publisher_id, subject) {
        Some(key) => key.to_string(),
        None => {
            warn!("Message on unexpected subject {}, terminating", subject);
            if let Err(e) = msg.ack_with(jetstream::AckKind::Term).await {
                error!("Failed to terminate message: {}", e);
            }
            return;
        }
    };

    let content: Value = match serde_json::from_slice(&msg.payload) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to parse message on {}: {}", routing_key, e);
            MESSAGE_RECEIVE_TOTAL
                .with_label_values(&[publisher_id, "parse_error"])
                .inc();

            // Terminate bad message (won't be redelivered)
            if let Err(term_err) = msg.ack_with(jetstream::AckKind::Term).await {
                error!("Failed to terminate bad message: {}", term_err);
            }
            return;
        }
    };

    if !routing_keys.iter().any(|key| key == &routing_key) {
        debug!("Routing key {} not in listened set, delivering for validation", routing_key);
    }

    MESSAGE_RECEIVE_TOTAL
        .with_label_values(&[publisher_id, "success"])
        .inc();

    let (message_id, delivery_count) = match msg.info() {
        Ok(info) => (
            Some(format!("{}:{}", info.stream, info.stream_sequence)),
            info.delivered.max(1) as u64,
        ),
        Err(_) => (None, 1),
    };

    let mut received = ReceivedMessage::new(
        routing_key,
        content,
        Box::new(JetStreamAcknowledger {
            message: msg,
            requeue_delay,
        }),
    )
    .with_delivery_count(delivery_count);

    if let Some(id) = message_id {
        received = received.with_message_id(id);
    }

    handler.handle(received).await;
}

#[async_trait]
impl ConsumerWatchdog for JetStreamConsumer {
    async fn listen(
        &self,
        publisher_id: &str,
        routing_keys: &[String],
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()> {
        let stream_name = stream_name_for(publisher_id);
        let filter_subject = wildcard_subject(publisher_id);

        info!(
            "Subscribing to JetStream stream: {} (consumer: {})",
            stream_name, self.config.durable_name
        );

        let stream = self
            .client
            .get_or_create_stream(&stream_name, vec![filter_subject.clone()])
            .await?;

        let consumer_config = consumer::pull::Config {
            durable_name: Some(self.config.durable_name.clone()),
            filter_subject,
            ack_policy: consumer::AckPolicy::Explicit,
            ack_wait: self.config.ack_wait,
            max_deliver: self.config.max_deliver,
            deliver_policy: consumer::DeliverPolicy::All,
            ..Default::default()
        };

        let consumer = stream
            .create_consumer(consumer_config)
            .await
            .map_err(|e| Error::Subscribe(e.to_string()))?;

        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| Error::Subscribe(e.to_string()))?;

        info!("✅ JetStream consumer created");

        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();
        let task_publisher_id = publisher_id.to_string();
        let routing_keys = routing_keys.to_vec();
        let requeue_delay = self.config.requeue_delay;

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Consumer for {} closing", task_publisher_id);
                        break;
                    }
                    next = messages.next() => match next {
                        Some(Ok(msg)) => {
                            // Runs to completion before the next pull.
                            deliver(&task_publisher_id, &routing_keys, msg, handler.as_ref(), requeue_delay).await;
                        }
                        Some(Err(e)) => {
                            error!("Error receiving message from {}: {}", task_publisher_id, e);
                            MESSAGE_RECEIVE_TOTAL
                                .with_label_values(&[task_publisher_id.as_str(), "receive_error"])
                                .inc();
                        }
                        None => {
                            warn!("Message stream for {} ended", task_publisher_id);
                            break;
                        }
                    }
                }
            }
        });

        self.listeners.lock().push(Listener {
            publisher_id: publisher_id.to_string(),
            shutdown,
            task,
        });

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let listeners = std::mem::take(&mut *self.listeners.lock());

        for listener in listeners {
            // The task may already have exited on its own.
            let _ = listener.shutdown.send(());
            if let Err(e) = listener.task.await {
                error!("Consumer task for {} failed: {}", listener.publisher_id, e);
            }
            info!("Stopped consuming from {}", listener.publisher_id);
        }

        Ok(())
    }
}
