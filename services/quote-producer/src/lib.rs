//! Quote producer service
//!
//! Drives the fetch → project → publish cycle on a wall-clock interval
//! and keeps producing through transient upstream failures:
//!
//! ```text
//! upstream API ──fetch──▶ Quote ──project──▶ NordicPrices
//!                                    │
//!                              QuoteEvent ──publish──▶ topic (keyed by symbol)
//! ```
//!
//! An unavailable upstream skips the cycle (shorter retry pacing, no
//! event); nothing in the loop is fatal after startup.

pub mod config;
pub mod fetch;
pub mod project;
pub mod publish;
