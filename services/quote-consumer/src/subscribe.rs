//! Event Subscriber: recv → flatten → sink → commit loop.
//!
//! Deliveries are processed one at a time in broker order; the offset
//! commits only after the sink write, so a crash between write and
//! commit redelivers the event and duplicates the row (accepted).
//!
//! Per-record failures never stop the loop: an undecodable payload or
//! a failed write is logged, the record dropped, and the offset still
//! committed so the loop moves on. Only startup errors are fatal, and
//! they happen before this loop is constructed.

use broker::{BrokerError, TopicConsumer};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use types::event::QuoteEvent;

use crate::flatten::flatten;
use crate::sink::RecordSink;

/// Drives the consume/flatten/append loop for one consumer group.
pub struct Subscriber {
    consumer: Box<dyn TopicConsumer>,
    sink: Box<dyn RecordSink>,
}

impl Subscriber {
    pub fn new(consumer: Box<dyn TopicConsumer>, sink: Box<dyn RecordSink>) -> Self {
        Self { consumer, sink }
    }

    /// Run until `shutdown` flips to true or the topic closes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!("subscriber loop started");
        loop {
            let delivery = tokio::select! {
                delivery = self.consumer.recv() => delivery,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("subscriber loop stopping");
                        return;
                    }
                    continue;
                }
            };

            let delivery = match delivery {
                Ok(delivery) => delivery,
                Err(BrokerError::Closed) => {
                    info!("topic closed, subscriber loop stopping");
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "consume failed, retrying");
                    continue;
                }
            };

            self.process(&delivery).await;

            if let Err(err) = self.consumer.commit(&delivery).await {
                // The broker may redeliver; duplicates are accepted.
                warn!(offset = delivery.offset, error = %err, "offset commit failed");
            }
        }
    }

    /// Flatten one delivery and hand it to the sink. Failures drop the
    /// record after logging; the caller still commits the offset.
    async fn process(&mut self, delivery: &broker::Delivery) {
        let event: QuoteEvent = match serde_json::from_slice(&delivery.payload) {
            Ok(event) => event,
            Err(err) => {
                error!(
                    offset = delivery.offset,
                    error = %err,
                    "undecodable event payload, dropping"
                );
                return;
            }
        };

        let row = flatten(&event, Utc::now());
        debug!(coin = %event.key(), columns = row.len(), "flattened event");

        if let Err(err) = self.sink.write(&row).await {
            error!(
                coin = %event.key(),
                offset = delivery.offset,
                error = %err,
                "sink write failed, record lost"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use broker::memory::MemoryTopic;
    use broker::TopicProducer;
    use types::currency::{Currency, NordicPrices};
    use types::quote::{Quote, QuoteBlock, UsdQuote};
    use types::row::ColumnValue;

    fn doge_event() -> QuoteEvent {
        let quote = Quote {
            symbol: "DOGE".to_string(),
            name: None,
            last_updated: Some("2024-05-01T12:00:00.000Z".to_string()),
            quote: Some(QuoteBlock {
                usd: Some(UsdQuote {
                    price: Some(0.5),
                    volume_24h: Some(1_000_000.0),
                    market_cap: Some(5_000_000.0),
                    percent_change_24h: Some(2.5),
                }),
            }),
        };
        let prices: NordicPrices = [(Currency::Sek, Some(5.65))].into_iter().collect();
        QuoteEvent::new(quote, prices)
    }

    async fn run_to_completion(topic: &std::sync::Arc<MemoryTopic>) -> MemorySink {
        topic.close().await;
        let sink = MemorySink::new();
        let mut subscriber = Subscriber::new(
            Box::new(topic.consumer("coin_group")),
            Box::new(sink.clone()),
        );
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        subscriber.run(shutdown_rx).await;
        sink
    }

    #[tokio::test]
    async fn consumes_events_into_rows_in_order() {
        let topic = MemoryTopic::new("coins");
        let event = doge_event();
        let payload = serde_json::to_vec(&event).unwrap();
        topic.publish(event.key(), &payload).await.unwrap();
        topic.publish(event.key(), &payload).await.unwrap();

        let sink = run_to_completion(&topic).await;
        assert_eq!(sink.rows().len(), 2);
        assert_eq!(
            sink.rows()[0].get("coin"),
            Some(&ColumnValue::Text("DOGE".to_string()))
        );
    }

    #[tokio::test]
    async fn undecodable_payload_is_dropped_not_fatal() {
        let topic = MemoryTopic::new("coins");
        topic.publish("DOGE", b"not json at all").await.unwrap();
        let payload = serde_json::to_vec(&doge_event()).unwrap();
        topic.publish("DOGE", &payload).await.unwrap();

        let sink = run_to_completion(&topic).await;
        // The poison message was skipped; the loop carried on.
        assert_eq!(sink.rows().len(), 1);
    }
}
