//! Message Bus with NATS support
//!
//! Provides the messaging primitives the credit-lines service builds on:
//! - Critical publish: JetStream persistence, broker ack, exponential backoff retry
//! - Durable pull consumers with explicit ack / term / nak
//! - One-shot settlement handles on delivered messages
//! - In-memory bus for tests
//! - Observability via Prometheus metrics

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod error;
pub mod memory;
pub mod message;
pub mod metrics;
pub mod publisher;
pub mod subscriber;
pub mod types;

pub use client::{NatsClient, NatsConfig};
pub use error::{Error, Result};
pub use memory::{InMemoryBus, PublishedMessage, SettlementLog};
pub use message::{Acknowledger, ReceivedMessage};
pub use publisher::{JetStreamPublisher, MessagePublisher, PublisherConfig};
pub use subscriber::{ConsumerWatchdog, JetStreamConsumer, MessageHandler, SubscriberConfig};
pub use types::{Disposition, PublishOptions};
