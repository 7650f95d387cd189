//! Bot descriptor.

use sirocco_core::types::{CandleLength, Market};

use crate::chart::ChartSeriesConfig;
use crate::context::Eval;

/// A trading bot, as consumed by the simulation driver.
///
/// The bot is a black box to the core: an eval tree that, evaluated
/// against the current context, produces the operation requests to
/// dispatch this tick (`Value::OperationRequests`, or `Value::None` for
/// no action). Metrics are exposed separately through the chart series
/// configuration.
#[derive(Debug, Clone)]
pub struct Bot {
    /// Bot name, for logs
    pub name: String,
    /// Markets the bot trades on
    pub markets: Vec<Market>,
    /// Candle length the bot's strategy operates on
    pub basic_candle_length: CandleLength,
    /// Eval producing the bot's order operations
    pub eval: Eval,
    /// Chart series to record while simulating
    pub chart_series: Vec<ChartSeriesConfig>,
}
