//! Types library for the coinpipe quote pipeline
//!
//! Shared type definitions used by the producer and consumer services,
//! keeping the wire format and the storage row shape in one place.
//!
//! # Modules
//! - `currency`: Nordic currency codes, fixed rate table, derived prices
//! - `quote`: upstream quote shapes as parsed at the ingress boundary
//! - `event`: the event published to the topic
//! - `row`: flattened storage row and column value taxonomy

pub mod currency;
pub mod event;
pub mod quote;
pub mod row;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::currency::*;
    pub use crate::event::*;
    pub use crate::quote::*;
    pub use crate::row::*;
}
