//! Event Publisher: the fetch → project → publish cycle.
//!
//! An unbounded loop paced by wall-clock sleeps: the normal interval
//! after a published event, a shorter retry interval after an
//! unavailable cycle (which publishes nothing). No state survives a
//! cycle, so a crash mid-cycle loses at most one event. A shutdown
//! signal is checked between cycles; the in-flight cycle completes
//! first.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use broker::TopicProducer;
use tokio::sync::watch;
use tracing::{error, info, warn};
use types::currency::RateTable;
use types::event::QuoteEvent;
use types::quote::Quote;

use crate::fetch::QuoteFetcher;
use crate::project::project;

/// Source of latest quotes. Seam between the loop and the upstream
/// API so pacing behavior is testable with a scripted source.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest quote for `symbol`, or `None` when unavailable.
    async fn latest(&self, symbol: &str) -> Option<Quote>;
}

#[async_trait]
impl QuoteSource for QuoteFetcher {
    async fn latest(&self, symbol: &str) -> Option<Quote> {
        self.fetch(symbol).await
    }
}

/// Pacing and projection parameters for the publisher loop.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub symbol: String,
    pub fetch_interval: Duration,
    pub retry_interval: Duration,
    pub rates: RateTable,
}

/// Outcome of one publish cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    Published,
    Skipped,
}

/// Drives the periodic fetch/project/publish loop.
pub struct Publisher {
    source: Arc<dyn QuoteSource>,
    topic: Arc<dyn TopicProducer>,
    config: PublisherConfig,
}

impl Publisher {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        topic: Arc<dyn TopicProducer>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            source,
            topic,
            config,
        }
    }

    /// Run until `shutdown` flips to true. Nothing inside the loop is
    /// fatal: unavailable quotes and failed publishes skip the cycle.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            symbol = %self.config.symbol,
            interval_secs = self.config.fetch_interval.as_secs(),
            retry_secs = self.config.retry_interval.as_secs(),
            "publisher loop started"
        );

        loop {
            let pause = match self.cycle().await {
                Cycle::Published => self.config.fetch_interval,
                Cycle::Skipped => self.config.retry_interval,
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("publisher loop stopping");
                        return;
                    }
                }
            }
        }
    }

    /// One fetch/project/publish cycle.
    async fn cycle(&self) -> Cycle {
        let symbol = &self.config.symbol;
        let Some(quote) = self.source.latest(symbol).await else {
            warn!(symbol = %symbol, "no data available, skipping cycle");
            return Cycle::Skipped;
        };

        let nordic_prices = project(quote.price_usd(), &self.config.rates);
        let event = QuoteEvent::new(quote, nordic_prices);

        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(err) => {
                error!(symbol = %symbol, error = %err, "event serialization failed");
                return Cycle::Skipped;
            }
        };

        if let Err(err) = self.topic.publish(event.key(), &payload).await {
            error!(symbol = %symbol, error = %err, "publish failed, skipping cycle");
            return Cycle::Skipped;
        }

        info!("{}", production_summary(&event));
        Cycle::Published
    }
}

/// One-line cycle summary: symbol, USD price, each nordic price.
fn production_summary(event: &QuoteEvent) -> String {
    let mut line = format!("Producing {}", event.key());
    match event.quote.price_usd() {
        Some(usd) => {
            let _ = write!(line, " | USD: {usd:.4}");
        }
        None => line.push_str(" | USD: n/a"),
    }
    for (currency, price) in event.nordic_prices.iter() {
        match price {
            Some(price) => {
                let _ = write!(line, " | {currency}: {price:.4}");
            }
            None => {
                let _ = write!(line, " | {currency}: n/a");
            }
        }
    }
    line
}
