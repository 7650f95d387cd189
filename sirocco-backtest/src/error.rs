//! Simulation error types.

use thiserror::Error;

use sirocco_core::data::{DataValidationError, OrderError};
use sirocco_core::types::{ExchangeId, Market, OrderId, Quantity};

/// Fatal simulation error.
///
/// Everything in this enum halts the replay loop. Per-order inconsistencies
/// live in [`crate::tracking::OrderTrackingError`] and rejected operations
/// in [`InvalidOrder`]; neither is fatal.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// A history loader did not produce within the configured timeout
    #[error("loader for {input} timed out after {timeout_ms} ms")]
    LoaderTimeout {
        /// Input the loader was feeding
        input: String,
        /// Configured timeout
        timeout_ms: u64,
    },

    /// A history loader failed
    #[error("loader for {input} failed: {reason}")]
    LoaderIo {
        /// Input the loader was feeding
        input: String,
        /// Loader-reported reason
        reason: String,
    },

    /// An eval referenced an input with no binding
    #[error("input not bound: {0}")]
    InputNotBound(String),

    /// A user eval failed; not recovered
    #[error("eval '{name}' failed: {reason}")]
    Eval {
        /// Name of the failing eval
        name: String,
        /// Failure description
        reason: String,
    },

    /// Exchange id has no connector
    #[error("unsupported exchange: {0}")]
    UnsupportedExchange(ExchangeId),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Market data violated a structural invariant
    #[error("data error: {0}")]
    Data(#[from] DataValidationError),

    /// Order arithmetic violated a structural invariant
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

/// Non-fatal order rejection.
///
/// Signaled back to the bot as a rejected operation; the simulation
/// continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidOrder {
    /// Quantity quantized to zero
    #[error("quantity {quantity} is zero after quantization")]
    ZeroQuantity {
        /// Requested quantity before quantization
        quantity: Quantity,
    },

    /// Declared side disagrees with the quantity's sign
    #[error("order side disagrees with quantity sign: {quantity}")]
    SideMismatch {
        /// Requested signed quantity
        quantity: Quantity,
    },

    /// No open order with this id
    #[error("unknown order: {0}")]
    UnknownOrder(OrderId),

    /// No marketplace for this market
    #[error("unknown market: {0}")]
    UnknownMarket(Market),

    /// Order construction failed
    #[error(transparent)]
    Order(#[from] OrderError),
}
