//! NATS connection shared by publishers and consumers

use crate::{Error, Result};
use async_nats::jetstream::{
    self,
    stream::{Config as StreamConfig, RetentionPolicy, StorageType},
};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// NATS connection configuration
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// Server url
    pub url: String,

    /// Connection name reported to the server
    pub name: String,

    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            name: "credit-lines".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Lazily connected NATS client
pub struct NatsClient {
    config: NatsConfig,
    client: OnceCell<async_nats::Client>,
}

impl NatsClient {
    /// Create new client; the connection is opened on first use
    pub fn new(config: NatsConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Connection configuration
    pub fn config(&self) -> &NatsConfig {
        &self.config
    }

    /// Core NATS client, connecting on first call
    pub async fn client(&self) -> Result<async_nats::Client> {
        let client = self
            .client
            .get_or_try_init(|| async {
                info!("Connecting to NATS at {}", self.config.url);
                async_nats::ConnectOptions::new()
                    .name(self.config.name.clone())
                    .connection_timeout(self.config.connect_timeout)
                    .connect(self.config.url.as_str())
                    .await
                    .map_err(|e| {
                        error!("❌ Failed to connect to NATS: {}", e);
                        Error::Connection(e.to_string())
                    })
            })
            .await?;

        Ok(client.clone())
    }

    /// JetStream context over the shared connection
    pub async fn jetstream(&self) -> Result<jetstream::Context> {
        Ok(jetstream::new(self.client().await?))
    }

    /// Get the named stream, creating it with `subjects` if missing
    pub async fn get_or_create_stream(
        &self,
        name: &str,
        subjects: Vec<String>,
    ) -> Result<jetstream::stream::Stream> {
        let js = self.jetstream().await?;

        let config = StreamConfig {
            name: name.to_string(),
            subjects,
            retention: RetentionPolicy::Limits,
            storage: StorageType::File,
            max_age: Duration::from_secs(7 * 24 * 3600),
            duplicate_window: Duration::from_secs(300),
            ..Default::default()
        };

        js.get_or_create_stream(config).await.map_err(|e| {
            error!("Failed to create stream {}: {}", name, e);
            Error::StreamCreation(e.to_string())
        })
    }
}
