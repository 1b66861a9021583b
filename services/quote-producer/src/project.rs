//! Currency Projector: derive same-instant nordic prices from the USD
//! quote and the fixed rate table.
//!
//! Pure and total: no I/O, no rounding, one output entry per
//! configured currency. An absent USD price yields null entries, never
//! a fault and never a NaN sentinel.

use types::currency::{NordicPrices, RateTable};

/// For each currency in `rates`, price_usd × rate.
pub fn project(price_usd: Option<f64>, rates: &RateTable) -> NordicPrices {
    rates
        .iter()
        .map(|(currency, rate)| (currency, price_usd.map(|price| price * rate)))
        .collect()
}
