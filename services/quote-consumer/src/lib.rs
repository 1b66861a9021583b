//! Quote consumer service
//!
//! Receives quote events from the topic in broker order, flattens each
//! into a column-per-field row, and appends it to the `cryptoprices`
//! table:
//!
//! ```text
//! topic ──recv──▶ QuoteEvent ──flatten──▶ QuoteRow ──append──▶ Postgres
//!   ▲                                                    │
//!   └────────────── offset commit after the write ◀──────┘
//! ```
//!
//! Offsets commit only after the sink write, so redelivery after a
//! restart duplicates rows rather than losing them (at-least-once).

pub mod config;
pub mod flatten;
pub mod sink;
pub mod subscribe;
