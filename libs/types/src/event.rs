//! The event published to the topic.

use serde::{Deserialize, Serialize};

use crate::currency::NordicPrices;
use crate::quote::Quote;

/// One published quote reading, keyed by symbol on the topic.
///
/// Carries the fetched quote plus the derived nordic price map.
/// Immutable once published; lifetime bounded by topic retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteEvent {
    #[serde(flatten)]
    pub quote: Quote,
    #[serde(default)]
    pub nordic_prices: NordicPrices,
}

impl QuoteEvent {
    pub fn new(quote: Quote, nordic_prices: NordicPrices) -> Self {
        Self {
            quote,
            nordic_prices,
        }
    }

    /// Partition/dedup key on the topic.
    pub fn key(&self) -> &str {
        &self.quote.symbol
    }
}
