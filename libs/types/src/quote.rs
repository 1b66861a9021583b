//! Upstream quote shapes as parsed at the ingress boundary.
//!
//! Every field the upstream API may omit is an `Option`: a partial
//! payload degrades to nulls downstream instead of failing the parse.

use serde::{Deserialize, Serialize};

/// USD-denominated figures from the upstream `quote.USD` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsdQuote {
    pub price: Option<f64>,
    pub volume_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub percent_change_24h: Option<f64>,
}

/// Per-currency quote container (`quote` in the upstream payload).
///
/// Only USD is requested; other conversions are derived locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteBlock {
    #[serde(rename = "USD")]
    pub usd: Option<UsdQuote>,
}

/// One fetched quote for a single symbol.
///
/// Transient: produced by the fetcher, consumed by projection and
/// event assembly, never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub quote: Option<QuoteBlock>,
}

impl Quote {
    /// The USD price, if the quote block carries one.
    pub fn price_usd(&self) -> Option<f64> {
        self.usd().and_then(|usd| usd.price)
    }

    /// The USD sub-quote, if present.
    pub fn usd(&self) -> Option<&UsdQuote> {
        self.quote.as_ref().and_then(|block| block.usd.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_upstream_shape() {
        let json = r#"{
            "symbol": "DOGE",
            "name": "Dogecoin",
            "last_updated": "2024-05-01T12:00:00.000Z",
            "quote": {
                "USD": {
                    "price": 0.5,
                    "volume_24h": 1000000.0,
                    "market_cap": 5000000.0,
                    "percent_change_24h": 2.5
                }
            }
        }"#;

        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.symbol, "DOGE");
        assert_eq!(quote.price_usd(), Some(0.5));
        assert_eq!(quote.usd().unwrap().volume_24h, Some(1_000_000.0));
    }

    #[test]
    fn partial_payload_degrades_to_none() {
        let quote: Quote = serde_json::from_str(r#"{"symbol": "DOGE"}"#).unwrap();
        assert_eq!(quote.name, None);
        assert_eq!(quote.price_usd(), None);
        assert!(quote.usd().is_none());
    }

    #[test]
    fn missing_usd_block_is_not_a_fault() {
        let quote: Quote =
            serde_json::from_str(r#"{"symbol": "DOGE", "quote": {}}"#).unwrap();
        assert_eq!(quote.price_usd(), None);
    }
}
