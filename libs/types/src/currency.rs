//! Nordic currency codes, the fixed conversion rate table, and the
//! derived per-currency price map.
//!
//! The currency set is closed: the pipeline converts the USD quote into
//! exactly these currencies, and every derived map carries one entry per
//! currency even when the source price is unavailable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Target currencies for derived prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Sek,
    Nok,
    Dkk,
    Eur,
}

impl Currency {
    /// All configured currencies, in stable order.
    pub const ALL: [Currency; 4] = [Currency::Sek, Currency::Nok, Currency::Dkk, Currency::Eur];

    /// Upper-case ISO code, as used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Sek => "SEK",
            Currency::Nok => "NOK",
            Currency::Dkk => "DKK",
            Currency::Eur => "EUR",
        }
    }

    /// Storage column name for this currency's derived price.
    pub fn column(&self) -> &'static str {
        match self {
            Currency::Sek => "price_sek",
            Currency::Nok => "price_nok",
            Currency::Dkk => "price_dkk",
            Currency::Eur => "price_eur",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Fixed USD conversion rates, one per configured currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    rates: BTreeMap<Currency, f64>,
}

impl RateTable {
    /// Build a table from explicit (currency, rate) pairs.
    pub fn new(pairs: impl IntoIterator<Item = (Currency, f64)>) -> Self {
        Self {
            rates: pairs.into_iter().collect(),
        }
    }

    pub fn rate(&self, currency: Currency) -> Option<f64> {
        self.rates.get(&currency).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        self.rates.iter().map(|(c, r)| (*c, *r))
    }
}

impl Default for RateTable {
    /// The pipeline's static conversion table.
    fn default() -> Self {
        Self::new([
            (Currency::Sek, 11.3),
            (Currency::Nok, 10.6),
            (Currency::Dkk, 6.9),
            (Currency::Eur, 0.92),
        ])
    }
}

/// Derived same-instant prices, one entry per configured currency.
///
/// An entry is `None` when the source USD price was unavailable; the
/// entry itself is never missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NordicPrices(BTreeMap<Currency, Option<f64>>);

impl NordicPrices {
    pub fn insert(&mut self, currency: Currency, price: Option<f64>) {
        self.0.insert(currency, price);
    }

    pub fn get(&self, currency: Currency) -> Option<f64> {
        self.0.get(&currency).copied().flatten()
    }

    /// Whether this map carries an entry (even a null one) for `currency`.
    pub fn contains(&self, currency: Currency) -> bool {
        self.0.contains_key(&currency)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, Option<f64>)> + '_ {
        self.0.iter().map(|(c, p)| (*c, *p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Currency, Option<f64>)> for NordicPrices {
    fn from_iter<T: IntoIterator<Item = (Currency, Option<f64>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_table_covers_all_currencies() {
        let rates = RateTable::default();
        for currency in Currency::ALL {
            assert!(rates.rate(currency).is_some(), "{currency} missing a rate");
        }
    }

    #[test]
    fn currency_serializes_as_upper_case_code() {
        let json = serde_json::to_string(&Currency::Sek).unwrap();
        assert_eq!(json, "\"SEK\"");
        let back: Currency = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(back, Currency::Eur);
    }

    #[test]
    fn nordic_prices_round_trips_with_null_entries() {
        let prices: NordicPrices = [
            (Currency::Sek, Some(5.65)),
            (Currency::Nok, None),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&prices).unwrap();
        let back: NordicPrices = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(Currency::Sek), Some(5.65));
        assert!(back.contains(Currency::Nok));
        assert_eq!(back.get(Currency::Nok), None);
    }
}
