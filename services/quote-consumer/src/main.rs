use broker::kafka::KafkaTopicConsumer;
use quote_consumer::config::ConsumerConfig;
use quote_consumer::sink::PostgresSink;
use quote_consumer::subscribe::Subscriber;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // .env is optional; real deployments use the environment directly.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ConsumerConfig::from_env()?;
    tracing::info!(
        brokers = %config.brokers,
        topic = %config.topic,
        group = %config.group,
        table = %config.table,
        "starting quote consumer"
    );

    // Both connections are fatal at startup if unavailable.
    let sink = PostgresSink::connect(&config.database_url, &config.table).await?;
    let consumer = KafkaTopicConsumer::connect(&config.brokers, &config.topic, &config.group)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut subscriber = Subscriber::new(Box::new(consumer), Box::new(sink));
    subscriber.run(shutdown_rx).await;
    tracing::info!("quote consumer stopped");
    Ok(())
}
