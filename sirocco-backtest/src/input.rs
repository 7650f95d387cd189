//! Input identifiers and the values bound to them.

use rust_decimal::Decimal;
use std::fmt;

use sirocco_core::data::{Candle, CandleHistorySegment, IncrementalSeries, Order, Trade, TradeHistorySegment};
use sirocco_core::types::{CandleLength, Market, Timestamp};

use crate::operation::{CompletedOperation, OperationRequest};
use crate::tracking::OrderTrackingEvent;

/// Typed identifier for an external data source.
///
/// Inputs are the leaves of the evaluation DAG; the context maps each
/// bound input to its current [`Value`]. Equal-time stream events are
/// ordered by `(kind_rank, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Input {
    /// Current simulated time, rounded down to the resolution
    Time(CandleLength),
    /// Append-only candle history for one market
    CandleHistory {
        /// Market the candles belong to
        market: Market,
        /// Candle duration
        candle_length: CandleLength,
        /// Segment alignment instant
        start: Timestamp,
    },
    /// Append-only own-trade history for one market
    TradeHistory {
        /// Market the trades belong to
        market: Market,
        /// Earliest admissible trade time
        start: Timestamp,
    },
    /// Currently open simulated orders for one market
    SimulatedOpenOrders(Market),
    /// History of observed-order snapshots for one market
    OrderSnapshotHistory(Market),
    /// Ordered sequence of completed operation requests this session
    CompletedOperationRequests,
}

impl Input {
    /// Fixed rank of the input kind, used for equal-time ordering.
    #[must_use]
    pub fn kind_rank(&self) -> u8 {
        match self {
            Self::Time(_) => 0,
            Self::CandleHistory { .. } => 1,
            Self::TradeHistory { .. } => 2,
            Self::SimulatedOpenOrders(_) => 3,
            Self::OrderSnapshotHistory(_) => 4,
            Self::CompletedOperationRequests => 5,
        }
    }

    /// Key of the input within its kind, used for equal-time ordering.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Time(resolution) => resolution.to_string(),
            Self::CandleHistory {
                market,
                candle_length,
                start,
            } => format!("{market}/{candle_length}/{start}"),
            Self::TradeHistory { market, start } => format!("{market}/{start}"),
            Self::SimulatedOpenOrders(market) | Self::OrderSnapshotHistory(market) => {
                market.to_string()
            }
            Self::CompletedOperationRequests => String::new(),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time(resolution) => write!(f, "time({resolution})"),
            Self::CandleHistory {
                market,
                candle_length,
                start,
            } => write!(f, "candles({market}, {candle_length}, {start})"),
            Self::TradeHistory { market, start } => write!(f, "trades({market}, {start})"),
            Self::SimulatedOpenOrders(market) => write!(f, "open-orders({market})"),
            Self::OrderSnapshotHistory(market) => write!(f, "order-snapshots({market})"),
            Self::CompletedOperationRequests => write!(f, "completed-operations"),
        }
    }
}

/// A value bound to an input or produced by an eval.
///
/// The domain of eval values is finite, so a closed sum type is used
/// rather than dynamic typing; equality and cloning stay structural.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value
    None,
    /// Boolean
    Bool(bool),
    /// Numeric value
    Decimal(Decimal),
    /// Point in time
    Time(Timestamp),
    /// Candle history segment
    Candles(CandleHistorySegment),
    /// Trade history segment
    Trades(TradeHistorySegment),
    /// Open orders, ascending by order id
    Orders(Vec<Order>),
    /// Order tracking event log
    TrackingEvents(IncrementalSeries<OrderTrackingEvent>),
    /// Completed operation requests
    Operations(IncrementalSeries<CompletedOperation>),
    /// Operation requests produced by a bot eval
    OperationRequests(Vec<OperationRequest>),
    /// Heterogeneous list
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Decimal(_) => "decimal",
            Self::Time(_) => "time",
            Self::Candles(_) => "candles",
            Self::Trades(_) => "trades",
            Self::Orders(_) => "orders",
            Self::TrackingEvents(_) => "tracking-events",
            Self::Operations(_) => "operations",
            Self::OperationRequests(_) => "operation-requests",
            Self::List(_) => "list",
        }
    }

    /// Returns the numeric value, if this is one.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the timestamp, if this is one.
    #[must_use]
    pub fn as_time(&self) -> Option<Timestamp> {
        match self {
            Self::Time(time) => Some(*time),
            _ => None,
        }
    }

    /// Returns the candle segment, if this is one.
    #[must_use]
    pub fn as_candles(&self) -> Option<&CandleHistorySegment> {
        match self {
            Self::Candles(segment) => Some(segment),
            _ => None,
        }
    }

    /// Returns the trade segment, if this is one.
    #[must_use]
    pub fn as_trades(&self) -> Option<&TradeHistorySegment> {
        match self {
            Self::Trades(segment) => Some(segment),
            _ => None,
        }
    }

    /// Returns the open orders, if this is an order set.
    #[must_use]
    pub fn as_orders(&self) -> Option<&[Order]> {
        match self {
            Self::Orders(orders) => Some(orders),
            _ => None,
        }
    }

    /// Length of the underlying incremental sequence, if this value is one.
    #[must_use]
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            Self::Candles(segment) => Some(segment.len()),
            Self::Trades(segment) => Some(segment.len()),
            Self::TrackingEvents(series) => Some(series.len()),
            Self::Operations(series) => Some(series.len()),
            _ => None,
        }
    }

    /// Item `index` of the underlying incremental sequence.
    #[must_use]
    pub fn sequence_item(&self, index: usize) -> Option<SeqItem> {
        match self {
            Self::Candles(segment) => segment.get(index).cloned().map(SeqItem::Candle),
            Self::Trades(segment) => segment.get(index).cloned().map(SeqItem::Trade),
            Self::TrackingEvents(series) => series.get(index).cloned().map(SeqItem::Tracking),
            Self::Operations(series) => series.get(index).cloned().map(SeqItem::Operation),
            _ => None,
        }
    }
}

/// One element of an incremental sequence, as seen by a fold step.
#[derive(Debug, Clone, PartialEq)]
pub enum SeqItem {
    /// A candle from a candle history segment
    Candle(Candle),
    /// A trade from a trade history segment
    Trade(Trade),
    /// An order tracking event
    Tracking(OrderTrackingEvent),
    /// A completed operation request
    Operation(CompletedOperation),
}
