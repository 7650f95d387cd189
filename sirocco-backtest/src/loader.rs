//! History loader seams.
//!
//! The simulation core consumes candle and trade histories through these
//! narrow interfaces. Production connectors implement them over exchange
//! REST clients and on-disk caches; tests and offline replays use the
//! in-memory implementations below. Loads are the only suspension points
//! of a simulation and are awaited with a bounded timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use sirocco_core::data::{Candle, CandleHistorySegment, Trade, TradeHistorySegment};
use sirocco_core::types::{CandleLength, ExchangeId, Market, Timestamp};

use crate::error::SimulationError;
use crate::input::Input;

/// Loader failure, reported by a connector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// Underlying I/O failed
    #[error("I/O failure: {0}")]
    Io(String),

    /// The connector has no data for this market
    #[error("no data for market {0}")]
    UnknownMarket(Market),
}

/// Loads candle history for one market.
#[async_trait]
pub trait CandleHistoryLoader: Send + Sync {
    /// Returns all candles with `start_time ∈ [start, end)`, contiguous,
    /// aligned and ordered.
    async fn load(
        &self,
        market: &Market,
        candle_length: CandleLength,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<CandleHistorySegment, LoaderError>;
}

/// Loads own-trade history for one market.
#[async_trait]
pub trait TradeHistoryLoader: Send + Sync {
    /// Returns all trades with `time >= start` (and `< end` when given),
    /// ordered by `(time, insertion order)`.
    async fn load_history(
        &self,
        market: &Market,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<TradeHistorySegment, LoaderError>;
}

/// A connector to one exchange, used only to obtain loaders.
pub trait ExchangeConnector: Send + Sync {
    /// The candle history loader of this exchange.
    fn candle_loader(&self) -> &dyn CandleHistoryLoader;

    /// The trade history loader of this exchange.
    fn trade_loader(&self) -> &dyn TradeHistoryLoader;
}

/// Resolves exchange ids to connectors.
pub trait ExchangeConnectorProvider: Send + Sync {
    /// Returns the connector for `exchange`.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::UnsupportedExchange` for unknown ids.
    fn connect(&self, exchange: &ExchangeId) -> Result<Arc<dyn ExchangeConnector>, SimulationError>;
}

/// Awaits a candle load with a bounded timeout.
pub(crate) async fn load_candles_with_timeout(
    loader: &dyn CandleHistoryLoader,
    input: &Input,
    market: &Market,
    candle_length: CandleLength,
    start: Timestamp,
    end: Timestamp,
    timeout: Duration,
) -> Result<CandleHistorySegment, SimulationError> {
    let load = loader.load(market, candle_length, start, end);
    match tokio::time::timeout(timeout, load).await {
        Err(_) => Err(SimulationError::LoaderTimeout {
            input: input.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
        Ok(Err(error)) => Err(SimulationError::LoaderIo {
            input: input.to_string(),
            reason: error.to_string(),
        }),
        Ok(Ok(segment)) => Ok(segment),
    }
}

/// Awaits a trade load with a bounded timeout.
pub(crate) async fn load_trades_with_timeout(
    loader: &dyn TradeHistoryLoader,
    input: &Input,
    market: &Market,
    start: Timestamp,
    end: Option<Timestamp>,
    timeout: Duration,
) -> Result<TradeHistorySegment, SimulationError> {
    let load = loader.load_history(market, start, end);
    match tokio::time::timeout(timeout, load).await {
        Err(_) => Err(SimulationError::LoaderTimeout {
            input: input.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
        Ok(Err(error)) => Err(SimulationError::LoaderIo {
            input: input.to_string(),
            reason: error.to_string(),
        }),
        Ok(Ok(segment)) => Ok(segment),
    }
}

/// In-memory connector serving preloaded candle and trade histories.
///
/// Deterministic and instant; the workhorse of simulation tests.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    candles: HashMap<(Market, CandleLength), Vec<Candle>>,
    trades: HashMap<Market, Vec<Trade>>,
}

impl MemoryConnector {
    /// Creates an empty connector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds candle history for a market.
    #[must_use]
    pub fn with_candles(
        mut self,
        market: Market,
        candle_length: CandleLength,
        candles: Vec<Candle>,
    ) -> Self {
        self.candles.insert((market, candle_length), candles);
        self
    }

    /// Adds own-trade history for a market.
    #[must_use]
    pub fn with_trades(mut self, market: Market, trades: Vec<Trade>) -> Self {
        self.trades.insert(market, trades);
        self
    }
}

#[async_trait]
impl CandleHistoryLoader for MemoryConnector {
    async fn load(
        &self,
        market: &Market,
        candle_length: CandleLength,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<CandleHistorySegment, LoaderError> {
        let candles = self
            .candles
            .get(&(market.clone(), candle_length))
            .ok_or_else(|| LoaderError::UnknownMarket(market.clone()))?;
        let selected: Vec<Candle> = candles
            .iter()
            .filter(|candle| candle.start_time >= start && candle.start_time < end)
            .cloned()
            .collect();
        let segment_start = selected.first().map_or(start, |candle| candle.start_time);
        CandleHistorySegment::from_candles(segment_start, candle_length, selected)
            .map_err(|error| LoaderError::Io(error.to_string()))
    }
}

#[async_trait]
impl TradeHistoryLoader for MemoryConnector {
    async fn load_history(
        &self,
        market: &Market,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<TradeHistorySegment, LoaderError> {
        let trades = self.trades.get(market).cloned().unwrap_or_default();
        let selected: Vec<Trade> = trades
            .into_iter()
            .filter(|trade| trade.time >= start && end.is_none_or(|end| trade.time < end))
            .collect();
        TradeHistorySegment::from_trades(start, selected)
            .map_err(|error| LoaderError::Io(error.to_string()))
    }
}

impl ExchangeConnector for MemoryConnector {
    fn candle_loader(&self) -> &dyn CandleHistoryLoader {
        self
    }

    fn trade_loader(&self) -> &dyn TradeHistoryLoader {
        self
    }
}

/// Provider over a fixed set of in-memory connectors.
#[derive(Default)]
pub struct MemoryConnectorProvider {
    connectors: HashMap<ExchangeId, Arc<MemoryConnector>>,
}

impl MemoryConnectorProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connector for an exchange.
    #[must_use]
    pub fn with_connector(mut self, exchange: ExchangeId, connector: MemoryConnector) -> Self {
        self.connectors.insert(exchange, Arc::new(connector));
        self
    }
}

impl ExchangeConnectorProvider for MemoryConnectorProvider {
    fn connect(&self, exchange: &ExchangeId) -> Result<Arc<dyn ExchangeConnector>, SimulationError> {
        self.connectors
            .get(exchange)
            .cloned()
            .map(|connector| connector as Arc<dyn ExchangeConnector>)
            .ok_or_else(|| SimulationError::UnsupportedExchange(exchange.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sirocco_core::types::{Amount, Price};

    fn market() -> Market {
        "binance:BTC-USD".parse().unwrap()
    }

    fn candle(start_ms: i64) -> Candle {
        Candle::builder()
            .start_time(Timestamp::new_unchecked(start_ms))
            .length(CandleLength::MINUTE_1)
            .open(Price::new_unchecked(dec!(100)))
            .high(Price::new_unchecked(dec!(101)))
            .low(Price::new_unchecked(dec!(99)))
            .close(Price::new_unchecked(dec!(100)))
            .quote_volume(Amount::new_unchecked(dec!(1000)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_memory_connector_filters_by_range() {
        let connector = MemoryConnector::new().with_candles(
            market(),
            CandleLength::MINUTE_1,
            vec![candle(0), candle(60_000), candle(120_000)],
        );

        let segment = connector
            .load(
                &market(),
                CandleLength::MINUTE_1,
                Timestamp::new_unchecked(60_000),
                Timestamp::new_unchecked(120_000),
            )
            .await
            .unwrap();
        assert_eq!(segment.len(), 1);
        assert_eq!(segment.start.as_millis(), 60_000);
    }

    #[tokio::test]
    async fn test_memory_connector_unknown_market() {
        let connector = MemoryConnector::new();
        let result = connector
            .load(
                &market(),
                CandleLength::MINUTE_1,
                Timestamp::ZERO,
                Timestamp::new_unchecked(60_000),
            )
            .await;
        assert!(matches!(result, Err(LoaderError::UnknownMarket(_))));
    }

    #[test]
    fn test_provider_rejects_unknown_exchange() {
        let provider = MemoryConnectorProvider::new();
        let exchange = ExchangeId::new("kraken").unwrap();
        assert!(matches!(
            provider.connect(&exchange),
            Err(SimulationError::UnsupportedExchange(_))
        ));
    }
}
