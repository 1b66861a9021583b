//! Topic abstraction for the coinpipe quote pipeline
//!
//! The producer and consumer services talk to the topic through the
//! [`TopicProducer`] and [`TopicConsumer`] traits. The Kafka backend is
//! the production implementation; [`memory::MemoryTopic`] models the
//! same keyed, offset-committed, at-least-once semantics in process so
//! pipeline behavior is testable without a broker.

pub mod kafka;
pub mod memory;

use async_trait::async_trait;

/// Errors surfaced by topic backends.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Backend client error (connection, protocol, commit).
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// A publish was not acknowledged by the broker.
    #[error("publish failed: {0}")]
    Publish(String),

    /// The topic has no more messages and never will (in-memory backend
    /// after close; a real broker consumer blocks instead).
    #[error("topic closed")]
    Closed,
}

/// One message delivered from the topic.
///
/// Carries enough position information for the consumer to commit the
/// offset after the downstream write succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

/// Write side of a topic.
#[async_trait]
pub trait TopicProducer: Send + Sync {
    /// Publish one message keyed by `key`. Returns once the broker has
    /// acknowledged the write.
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), BrokerError>;
}

/// Read side of a topic, scoped to one consumer group.
///
/// Delivery order within a key is the broker's order; offsets are
/// committed explicitly, after the downstream effect, which is what
/// makes the pipeline at-least-once.
#[async_trait]
pub trait TopicConsumer: Send + Sync {
    /// Block until the next message for this group is available.
    async fn recv(&self) -> Result<Delivery, BrokerError>;

    /// Commit the offset of a processed delivery.
    async fn commit(&self, delivery: &Delivery) -> Result<(), BrokerError>;
}
