//! Kafka topic backend.
//!
//! Producer side uses rdkafka's `FutureProducer`; consumer side a
//! `StreamConsumer` with auto-commit disabled, committing offsets
//! explicitly after the downstream write. First-run groups start from
//! the earliest retained offset.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::topic_partition_list::{Offset, TopicPartitionList};
use rdkafka::util::Timeout;
use tracing::{debug, info};

use crate::{BrokerError, Delivery, TopicConsumer, TopicProducer};

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka-backed [`TopicProducer`] for a single named topic.
pub struct KafkaTopicProducer {
    producer: FutureProducer,
    topic: String,
}

impl KafkaTopicProducer {
    /// Connect to the broker. Fails fast on unreachable/invalid broker
    /// configuration; that is a fatal startup error for the caller.
    pub fn connect(brokers: &str, topic: &str) -> Result<Self, BrokerError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        info!(brokers, topic, "kafka producer connected");
        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl TopicProducer for KafkaTopicProducer {
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);
        let (partition, offset) = self
            .producer
            .send(record, Timeout::After(PUBLISH_TIMEOUT))
            .await
            .map_err(|(err, _)| BrokerError::Publish(err.to_string()))?;

        debug!(topic = %self.topic, key, partition, offset, "published");
        Ok(())
    }
}

/// Kafka-backed [`TopicConsumer`] scoped to one consumer group.
pub struct KafkaTopicConsumer {
    consumer: StreamConsumer,
}

impl KafkaTopicConsumer {
    /// Connect and subscribe. `auto.offset.reset = earliest` so a new
    /// group replays the full retained topic on first run.
    pub fn connect(brokers: &str, topic: &str, group: &str) -> Result<Self, BrokerError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .set("enable.partition.eof", "false")
            .create()?;

        consumer.subscribe(&[topic])?;
        info!(brokers, topic, group, "kafka consumer subscribed");
        Ok(Self { consumer })
    }
}

#[async_trait]
impl TopicConsumer for KafkaTopicConsumer {
    async fn recv(&self) -> Result<Delivery, BrokerError> {
        let message = self.consumer.recv().await?;
        Ok(Delivery {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message
                .key()
                .map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: message.payload().unwrap_or_default().to_vec(),
        })
    }

    async fn commit(&self, delivery: &Delivery) -> Result<(), BrokerError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &delivery.topic,
            delivery.partition,
            Offset::Offset(delivery.offset + 1),
        )?;
        self.consumer.commit(&tpl, CommitMode::Async)?;
        Ok(())
    }
}
