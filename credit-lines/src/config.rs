//! Service configuration
//!
//! Layered: built-in defaults, then `config/<ENVIRONMENT>` (or `CONFIG_FILE`),
//! then `CREDIT_LINES__*` variables, then the legacy variables shared with
//! the rest of the platform (`COMPANY_STATIC_ID`, `INTERNAL_MQ_*`, ...).

use config::builder::{ConfigBuilder, DefaultState};
use config::{ConfigError, Environment, File};
use message_bus::{NatsConfig, PublisherConfig, SubscriberConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Service configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Static id of the company this instance runs for
    pub company_static_id: String,
    /// NATS connection
    pub nats: NatsSettings,
    /// Publisher/consumer ids and retry policy
    pub messaging: MessagingConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// NATS connection settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NatsSettings {
    /// Server url
    pub url: String,
    /// Connection name
    pub connection_name: String,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

/// Messaging settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MessagingConfig {
    /// Durable consumer name
    pub consumer_id: String,
    /// Publisher id inbound messages arrive under
    pub inbound_publisher_id: String,
    /// Publisher id outbound messages are sent under
    pub outbound_publisher_id: String,
    /// Delivery attempts before the broker gives up on a message
    pub consumer_retries: i64,
    /// Delay before a requeued message is redelivered (ms)
    pub consume_retry_delay_ms: u64,
    /// Broker ack wait (s)
    pub ack_wait_secs: u64,
    /// Critical publish attempts
    pub publish_max_retries: u32,
}

/// Logging settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// JSON output
    pub json: bool,
}

fn default_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("company_static_id", "")?
        .set_default("nats.url", "nats://localhost:4222")?
        .set_default("nats.connection_name", "api-credit-lines")?
        .set_default("nats.connect_timeout_secs", 5)?
        .set_default("messaging.consumer_id", "api-credit-lines")?
        .set_default("messaging.inbound_publisher_id", "from-event-mgnt")?
        .set_default("messaging.outbound_publisher_id", "to-event-mgnt")?
        .set_default("messaging.consumer_retries", 3)?
        .set_default("messaging.consume_retry_delay_ms", 300)?
        .set_default("messaging.ack_wait_secs", 30)?
        .set_default("messaging.publish_max_retries", 3)?
        .set_default("logging.level", "info")?
        .set_default("logging.json", true)
}

impl Config {
    /// Load configuration from defaults, files and environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = default_builder()?;

        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        builder = builder.add_source(Environment::with_prefix("CREDIT_LINES").separator("__"));

        let overrides = [
            ("COMPANY_STATIC_ID", "company_static_id"),
            ("NATS_URL", "nats.url"),
            ("INTERNAL_MQ_CONSUMER_ID", "messaging.consumer_id"),
            ("INTERNAL_MQ_FROM_PUBLISHER_ID", "messaging.inbound_publisher_id"),
            ("INTERNAL_MQ_TO_PUBLISHER_ID", "messaging.outbound_publisher_id"),
            ("CONSUMER_RETRIES", "messaging.consumer_retries"),
            ("CONSUME_RETRY_DELAY", "messaging.consume_retry_delay_ms"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.company_static_id.trim().is_empty() {
            return Err("COMPANY_STATIC_ID is required".to_string());
        }

        if self.nats.url.is_empty() {
            return Err("NATS URL is required".to_string());
        }

        if self.messaging.consumer_id.is_empty() {
            return Err("Consumer id is required".to_string());
        }

        if self.messaging.inbound_publisher_id.is_empty()
            || self.messaging.outbound_publisher_id.is_empty()
        {
            return Err("Inbound and outbound publisher ids are required".to_string());
        }

        if self.messaging.consumer_retries <= 0 {
            return Err("Consumer retries must be positive".to_string());
        }

        if self.messaging.publish_max_retries == 0 {
            return Err("Publish retries must be positive".to_string());
        }

        Ok(())
    }

    /// NATS client settings
    pub fn nats_config(&self) -> NatsConfig {
        NatsConfig {
            url: self.nats.url.clone(),
            name: self.nats.connection_name.clone(),
            connect_timeout: Duration::from_secs(self.nats.connect_timeout_secs),
        }
    }

    /// Critical publisher settings
    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            max_retry_attempts: self.messaging.publish_max_retries,
            ..PublisherConfig::default()
        }
    }

    /// Durable consumer settings
    pub fn subscriber_config(&self) -> SubscriberConfig {
        SubscriberConfig {
            durable_name: self.messaging.consumer_id.clone(),
            ack_wait: Duration::from_secs(self.messaging.ack_wait_secs),
            max_deliver: self.messaging.consumer_retries,
            requeue_delay: Duration::from_millis(self.messaging.consume_retry_delay_ms),
        }
    }
}
