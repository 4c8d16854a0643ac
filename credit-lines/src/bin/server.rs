use anyhow::Context;
use credit_lines::{
    config::Config,
    data::{
        InMemoryCreditLineRequestDataAgent, InMemoryDepositLoanRequestDataAgent,
        InMemoryDisclosedCreditLineDataAgent, InMemoryDisclosedDepositLoanDataAgent,
    },
    processing::{default_processors, MessageProcessorService},
    request_client::RequestClient,
    requests::{CreditLineRequestService, DepositLoanRequestService},
};
use dotenv::dotenv;
use message_bus::{JetStreamConsumer, JetStreamPublisher, NatsClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_line_number(true)
            .init();
    }

    info!(
        company = %config.company_static_id,
        nats = %config.nats.url,
        "Starting credit lines service"
    );

    let nats = Arc::new(NatsClient::new(config.nats_config()));
    let publisher = Arc::new(JetStreamPublisher::new(
        nats.clone(),
        config.messaging.outbound_publisher_id.clone(),
        config.publisher_config(),
    ));
    let consumer = Arc::new(JetStreamConsumer::new(nats, config.subscriber_config()));

    let request_client = Arc::new(RequestClient::new(publisher));
    let credit_line_requests = Arc::new(CreditLineRequestService::new(
        config.company_static_id.clone(),
        Arc::new(InMemoryCreditLineRequestDataAgent::new()),
        request_client.clone(),
    ));
    let deposit_loan_requests = Arc::new(DepositLoanRequestService::new(
        config.company_static_id.clone(),
        Arc::new(InMemoryDepositLoanRequestDataAgent::new()),
        request_client,
    ));

    let registry = default_processors(
        &config.company_static_id,
        Arc::new(InMemoryDisclosedCreditLineDataAgent::new()),
        Arc::new(InMemoryDisclosedDepositLoanDataAgent::new()),
        credit_line_requests,
        deposit_loan_requests,
    );

    let processor = MessageProcessorService::new(
        consumer,
        config.messaging.inbound_publisher_id.clone(),
        registry,
    );
    processor.start().await.context("Failed to start message processor")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received");
    processor.stop().await.context("Failed to stop message processor")?;

    Ok(())
}
