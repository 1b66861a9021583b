//! Flattening transform: QuoteEvent → QuoteRow.
//!
//! Pure and total over any event matching the documented shape: every
//! absent optional field becomes an explicit null column, never a
//! fault. The ingestion timestamp is injected by the caller so the
//! transform stays deterministic.

use chrono::{DateTime, Utc};
use types::currency::Currency;
use types::event::QuoteEvent;
use types::row::{ColumnValue, QuoteRow};

/// Flatten one event into a storage row.
///
/// Column names follow the established table layout: `coin` (display
/// name, falling back to the symbol), `volume_24` (legacy name kept
/// for the dashboard), `updated` (upstream-supplied time), `timestamp`
/// (ingestion time), and one `price_<currency>` column per configured
/// currency.
pub fn flatten(event: &QuoteEvent, ingested_at: DateTime<Utc>) -> QuoteRow {
    let quote = &event.quote;
    let usd = quote.usd();

    let coin = quote
        .name
        .clone()
        .unwrap_or_else(|| quote.symbol.clone());

    let mut row = QuoteRow::new();
    row.set("coin", ColumnValue::Text(coin));
    row.set("price_usd", ColumnValue::from(usd.and_then(|u| u.price)));
    row.set(
        "volume_24",
        ColumnValue::from(usd.and_then(|u| u.volume_24h)),
    );
    row.set(
        "market_cap",
        ColumnValue::from(usd.and_then(|u| u.market_cap)),
    );
    row.set(
        "percent_change_24h",
        ColumnValue::from(usd.and_then(|u| u.percent_change_24h)),
    );
    row.set("updated", ColumnValue::from(quote.last_updated.clone()));

    for currency in Currency::ALL {
        row.set(
            currency.column(),
            ColumnValue::from(event.nordic_prices.get(currency)),
        );
    }

    row.set("timestamp", ColumnValue::Timestamp(ingested_at));
    row
}
