//! `NewType` wrappers for financial primitives.
//!
//! This module provides type-safe wrappers around decimal and integer
//! values to prevent mixing incompatible types at compile time.
//!
//! # Types
//!
//! - [`Price`] - Asset price values
//! - [`Quantity`] - Signed trading quantities (positive = buy/long)
//! - [`Amount`] - Monetary amounts in quote currency (price × quantity)
//! - [`Timestamp`] - Unix millisecond timestamps
//! - [`CandleLength`] - Fixed candle/resolution durations
//! - [`OrderId`] / [`TradeId`] - Identifiers
//! - [`Market`], [`TradingPair`], [`ExchangeId`] - Market identity

mod amount;
mod candle_length;
mod market;
mod order_id;
mod price;
mod quantity;
mod timestamp;
mod trade_id;

pub use amount::Amount;
pub use candle_length::CandleLength;
pub use market::{ExchangeId, Market, TradingPair};
pub use order_id::OrderId;
pub use price::Price;
pub use quantity::Quantity;
pub use timestamp::Timestamp;
pub use trade_id::TradeId;

/// Validation error for `NewType` construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Price value is negative
    #[error("price cannot be negative: {0}")]
    NegativePrice(rust_decimal::Decimal),

    /// Quantity value is negative where an unsigned quantity is required
    #[error("quantity cannot be negative: {0}")]
    NegativeQuantity(rust_decimal::Decimal),

    /// Amount value is negative
    #[error("amount cannot be negative: {0}")]
    NegativeAmount(rust_decimal::Decimal),

    /// Timestamp is negative
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Candle length is zero or negative
    #[error("candle length must be positive: {0} ms")]
    InvalidCandleLength(i64),

    /// Order ID is empty
    #[error("order ID cannot be empty")]
    EmptyOrderId,

    /// Trade ID is empty
    #[error("trade ID cannot be empty")]
    EmptyTradeId,

    /// Exchange ID is empty or malformed
    #[error("invalid exchange ID: {0:?}")]
    InvalidExchangeId(String),

    /// Trading pair is empty or malformed
    #[error("invalid trading pair: {0:?}")]
    InvalidTradingPair(String),
}
