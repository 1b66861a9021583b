//! In-process topic backend.
//!
//! A single-partition, ordered, append-only log with per-group offset
//! tracking. `rewind` models a consumer restart: the group's position
//! falls back to its last committed offset and every uncommitted
//! message is delivered again, which is exactly the duplication an
//! at-least-once pipeline must tolerate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::{BrokerError, Delivery, TopicConsumer, TopicProducer};

#[derive(Debug, Default)]
struct GroupState {
    /// Next offset to deliver.
    position: usize,
    /// First not-yet-committed offset.
    committed: usize,
}

#[derive(Debug, Default)]
struct TopicInner {
    log: Vec<(Option<String>, Vec<u8>)>,
    groups: HashMap<String, GroupState>,
    closed: bool,
}

/// In-process ordered topic shared between producers and consumers.
#[derive(Debug)]
pub struct MemoryTopic {
    name: String,
    inner: Mutex<TopicInner>,
    notify: Notify,
}

impl MemoryTopic {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            inner: Mutex::new(TopicInner::default()),
            notify: Notify::new(),
        })
    }

    /// Handle for consuming this topic as `group`.
    pub fn consumer(self: &Arc<Self>, group: &str) -> MemoryConsumer {
        MemoryConsumer {
            topic: Arc::clone(self),
            group: group.to_string(),
        }
    }

    /// Drop a group's uncommitted progress, as a consumer restart would.
    pub async fn rewind(&self, group: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(state) = inner.groups.get_mut(group) {
            state.position = state.committed;
        }
        self.notify.notify_waiters();
    }

    /// Close the topic; blocked consumers get [`BrokerError::Closed`]
    /// once the log is drained.
    pub async fn close(&self) {
        self.inner.lock().await.closed = true;
        self.notify.notify_waiters();
    }

    /// Number of messages ever published.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.log.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.log.is_empty()
    }
}

#[async_trait]
impl TopicProducer for MemoryTopic {
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(BrokerError::Closed);
        }
        inner.log.push((Some(key.to_string()), payload.to_vec()));
        drop(inner);
        self.notify.notify_waiters();
        Ok(())
    }
}

/// Per-group consumer handle over a [`MemoryTopic`].
pub struct MemoryConsumer {
    topic: Arc<MemoryTopic>,
    group: String,
}

#[async_trait]
impl TopicConsumer for MemoryConsumer {
    async fn recv(&self) -> Result<Delivery, BrokerError> {
        loop {
            // Register as a waiter before checking the log, otherwise a
            // publish landing between the check and the await is missed
            // and this consumer sleeps on a non-empty log.
            let mut notified = std::pin::pin!(self.topic.notify.notified());
            notified.as_mut().enable();
            {
                let mut inner = self.topic.inner.lock().await;
                let inner = &mut *inner;
                let state = inner.groups.entry(self.group.clone()).or_default();
                if state.position < inner.log.len() {
                    let offset = state.position;
                    state.position += 1;
                    let (key, payload) = inner.log[offset].clone();
                    return Ok(Delivery {
                        topic: self.topic.name.clone(),
                        partition: 0,
                        offset: offset as i64,
                        key,
                        payload,
                    });
                }
                if inner.closed {
                    return Err(BrokerError::Closed);
                }
            }
            notified.await;
        }
    }

    async fn commit(&self, delivery: &Delivery) -> Result<(), BrokerError> {
        let mut inner = self.topic.inner.lock().await;
        let state = inner.groups.entry(self.group.clone()).or_default();
        let next = (delivery.offset + 1) as usize;
        if next > state.committed {
            state.committed = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let topic = MemoryTopic::new("coins");
        let consumer = topic.consumer("coin_group");

        topic.publish("DOGE", b"one").await.unwrap();
        topic.publish("DOGE", b"two").await.unwrap();

        let first = consumer.recv().await.unwrap();
        let second = consumer.recv().await.unwrap();
        assert_eq!(first.payload, b"one");
        assert_eq!(second.payload, b"two");
        assert_eq!(first.key.as_deref(), Some("DOGE"));
    }

    #[tokio::test]
    async fn recv_blocks_until_publish() {
        let topic = MemoryTopic::new("coins");
        let consumer = topic.consumer("coin_group");

        let publisher = Arc::clone(&topic);
        let handle = tokio::spawn(async move {
            publisher.publish("DOGE", b"late").await.unwrap();
        });

        let delivery = consumer.recv().await.unwrap();
        assert_eq!(delivery.payload, b"late");
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn rewind_redelivers_uncommitted_messages() {
        let topic = MemoryTopic::new("coins");
        let consumer = topic.consumer("coin_group");

        topic.publish("DOGE", b"committed").await.unwrap();
        topic.publish("DOGE", b"in-flight").await.unwrap();

        let first = consumer.recv().await.unwrap();
        consumer.commit(&first).await.unwrap();
        let second = consumer.recv().await.unwrap();
        assert_eq!(second.payload, b"in-flight");

        // Restart before the second offset was committed.
        topic.rewind("coin_group").await;
        let redelivered = consumer.recv().await.unwrap();
        assert_eq!(redelivered.payload, b"in-flight");
        assert_eq!(redelivered.offset, second.offset);
    }

    #[tokio::test]
    async fn independent_groups_track_separate_offsets() {
        let topic = MemoryTopic::new("coins");
        let a = topic.consumer("group_a");
        let b = topic.consumer("group_b");

        topic.publish("DOGE", b"shared").await.unwrap();

        assert_eq!(a.recv().await.unwrap().payload, b"shared");
        assert_eq!(b.recv().await.unwrap().payload, b"shared");
    }

    #[tokio::test]
    async fn closed_topic_errors_after_drain() {
        let topic = MemoryTopic::new("coins");
        let consumer = topic.consumer("coin_group");

        topic.publish("DOGE", b"last").await.unwrap();
        topic.close().await;

        assert!(consumer.recv().await.is_ok());
        assert!(matches!(
            consumer.recv().await,
            Err(BrokerError::Closed)
        ));
    }

    // Publishes racing a blocked recv on real threads. A wakeup dropped
    // between the log check and the wait would strand the consumer here.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_publishes_never_strand_a_blocked_recv() {
        const ROUNDS: usize = 200;

        let topic = MemoryTopic::new("coins");
        let consumer = topic.consumer("coin_group");

        let publisher = Arc::clone(&topic);
        let handle = tokio::spawn(async move {
            for n in 0..ROUNDS {
                publisher
                    .publish("DOGE", format!("tick-{n}").as_bytes())
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        });

        for n in 0..ROUNDS {
            let delivery = tokio::time::timeout(
                std::time::Duration::from_secs(5),
                consumer.recv(),
            )
            .await
            .unwrap_or_else(|_| panic!("consumer stalled at message {n}"))
            .unwrap();
            assert_eq!(delivery.payload, format!("tick-{n}").as_bytes());
        }
        handle.await.unwrap();
    }
}
