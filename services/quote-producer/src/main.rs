use std::sync::Arc;

use broker::kafka::KafkaTopicProducer;
use broker::TopicProducer;
use quote_producer::config::ProducerConfig;
use quote_producer::fetch::QuoteFetcher;
use quote_producer::publish::{Publisher, PublisherConfig, QuoteSource};
use tokio::sync::watch;
use types::currency::RateTable;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // .env is optional; real deployments use the environment directly.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ProducerConfig::from_env()?;
    tracing::info!(
        brokers = %config.brokers,
        topic = %config.topic,
        symbol = %config.symbol,
        "starting quote producer"
    );

    let fetcher = QuoteFetcher::new(&config.api_base_url, &config.api_key)?;
    let topic = KafkaTopicProducer::connect(&config.brokers, &config.topic)?;

    let publisher = Publisher::new(
        Arc::new(fetcher) as Arc<dyn QuoteSource>,
        Arc::new(topic) as Arc<dyn TopicProducer>,
        PublisherConfig {
            symbol: config.symbol,
            fetch_interval: config.fetch_interval,
            retry_interval: config.retry_interval,
            rates: RateTable::default(),
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    publisher.run(shutdown_rx).await;
    tracing::info!("quote producer stopped");
    Ok(())
}
