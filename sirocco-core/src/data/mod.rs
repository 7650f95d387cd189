//! Market data structures.
//!
//! This module provides:
//! - [`Candle`] - OHLC bar over a fixed duration for one market
//! - [`CandleHistorySegment`] - contiguous, aligned candle history
//! - [`Trade`] - a single (own) trade with signed quantity
//! - [`TradeHistorySegment`] - append-only own-trade history
//! - [`Order`] - a simulated or observed order
//! - [`OrderConstraints`] / [`Precision`] - sizing constraints and quantization
//! - [`IncrementalSeries`] - append-only sequence with tail-sharing

mod candle;
mod constraints;
mod order;
mod segment;
mod series;
mod trade;

pub use candle::{Candle, CandleBuilder};
pub use constraints::{OrderConstraints, Precision};
pub use order::{Order, OrderError, OrderSide};
pub use segment::{CandleHistorySegment, TradeHistorySegment};
pub use series::IncrementalSeries;
pub use trade::Trade;

/// Validation error for market data structures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataValidationError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Prices violate OHLC coherence
    #[error("invalid price relation: {0}")]
    InvalidPriceRelation(String),

    /// Candle length does not match its segment
    #[error("candle length {candle} does not match segment length {segment}")]
    LengthMismatch {
        /// Length carried by the candle
        candle: crate::types::CandleLength,
        /// Length of the segment
        segment: crate::types::CandleLength,
    },

    /// Candle start time is not where the segment expects it
    #[error("candle at {actual} is not contiguous; expected start {expected}")]
    NonContiguousCandle {
        /// Expected start time
        expected: crate::types::Timestamp,
        /// Actual start time
        actual: crate::types::Timestamp,
    },

    /// Trade is earlier than the segment start or the preceding trade
    #[error("trade at {time} violates segment ordering (minimum {minimum})")]
    UnorderedTrade {
        /// Time of the offending trade
        time: crate::types::Timestamp,
        /// Earliest admissible time at this position
        minimum: crate::types::Timestamp,
    },

    /// Live segment does not overlap the stored one
    #[error("live segment starting at {live_start} begins before stored segment start {stored_start}")]
    DisjointSegments {
        /// Start of the stored segment
        stored_start: crate::types::Timestamp,
        /// Start of the live segment
        live_start: crate::types::Timestamp,
    },
}
