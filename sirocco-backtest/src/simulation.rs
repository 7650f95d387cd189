//! Simulation driver and configuration.
//!
//! Wires the pieces together: loads histories through the exchange
//! connectors (the only suspension points, bounded by the loader
//! timeout), builds the update stream and marketplaces, then replays the
//! interval tick by tick. Per tick: input update, marketplace matching,
//! bot re-evaluation, operation dispatch, logger snapshot — all stamped
//! with the event's time.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use sirocco_core::data::OrderConstraints;
use sirocco_core::types::{Market, OrderId, Timestamp};

use crate::bot::Bot;
use crate::chart::{ChartData, ChartDataLogger};
use crate::context::Context;
use crate::environment::SimulationEnvironment;
use crate::error::SimulationError;
use crate::input::{Input, Value};
use crate::loader::{
    load_candles_with_timeout, load_trades_with_timeout, ExchangeConnectorProvider,
};
use crate::marketplace::CandleMarketplace;
use crate::stream::{InputUpdate, TimedUpdateStream};
use crate::tracking::{BasicOrderTrackingState, TrackingRegistry};

fn default_volume_reduction() -> Decimal {
    Decimal::ONE
}

fn default_loader_timeout_ms() -> u64 {
    30_000
}

/// Configuration of one simulation run.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Simulation interval start (inclusive)
    pub start: Timestamp,
    /// Simulation interval end (inclusive)
    pub end: Timestamp,
    /// The traded market
    pub market: Market,
    /// Price and quantity precision of the market
    pub order_constraints: OrderConstraints,
    /// Fee fraction applied to every fill, quote-denominated
    pub fee_level: Decimal,
    /// Fraction of candle volume consumable per candle, in `(0, 1]`
    #[serde(default = "default_volume_reduction")]
    pub volume_reduction: Decimal,
    /// Budget for each initial history load, in milliseconds
    #[serde(default = "default_loader_timeout_ms")]
    pub loader_timeout_ms: u64,
    /// Directory where connectors may cache loaded histories
    #[serde(default)]
    pub cache_directory: Option<PathBuf>,
}

impl SimulationConfig {
    /// The loader timeout as a duration.
    #[must_use]
    pub fn loader_timeout(&self) -> Duration {
        Duration::from_millis(self.loader_timeout_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfig` on any violation.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.start >= self.end {
            return Err(SimulationError::InvalidConfig(format!(
                "start {} must precede end {}",
                self.start, self.end
            )));
        }
        if self.fee_level < Decimal::ZERO {
            return Err(SimulationError::InvalidConfig(format!(
                "fee level must be non-negative, got {}",
                self.fee_level
            )));
        }
        if self.volume_reduction <= Decimal::ZERO || self.volume_reduction > Decimal::ONE {
            return Err(SimulationError::InvalidConfig(format!(
                "volume reduction must be in (0, 1], got {}",
                self.volume_reduction
            )));
        }
        if self.loader_timeout_ms == 0 {
            return Err(SimulationError::InvalidConfig(
                "loader timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One prepared simulation run.
pub struct Simulation {
    bot: Bot,
    environment: SimulationEnvironment,
    logger: ChartDataLogger,
    tracking: BTreeMap<Market, TrackingRegistry>,
}

impl Simulation {
    /// Loads histories and assembles the simulation.
    ///
    /// This is the only suspension point of a run; every load is bounded
    /// by the configured loader timeout.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, unsupported exchanges, and loader
    /// timeouts or failures.
    pub async fn prepare(
        config: SimulationConfig,
        bot: Bot,
        provider: &dyn ExchangeConnectorProvider,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        if bot.markets.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "bot trades no markets".to_string(),
            ));
        }
        if !bot.markets.contains(&config.market) {
            return Err(SimulationError::InvalidConfig(format!(
                "configured market {} is not among the bot's markets",
                config.market
            )));
        }

        let resolution = bot.basic_candle_length;
        let timeout = config.loader_timeout();
        let mut context = Context::new();
        let mut marketplaces = BTreeMap::new();
        let mut sources = Vec::new();

        let time_input = Input::Time(resolution);
        context.update_input(
            time_input.clone(),
            Value::Time(config.start.floor_to(resolution)),
        );
        context.update_input(
            Input::CompletedOperationRequests,
            Value::Operations(sirocco_core::data::IncrementalSeries::new()),
        );
        sources.push((
            time_input,
            TimedUpdateStream::time_events(resolution, config.start, config.end),
        ));

        let mut tracking = BTreeMap::new();
        for market in &bot.markets {
            let connector = provider.connect(&market.exchange)?;

            let candle_input = Input::CandleHistory {
                market: market.clone(),
                candle_length: resolution,
                start: config.start,
            };
            let candles = load_candles_with_timeout(
                connector.candle_loader(),
                &candle_input,
                market,
                resolution,
                config.start,
                config.end,
                timeout,
            )
            .await?;
            debug!(market = %market, candles = candles.len(), "loaded candle history");

            let trade_input = Input::TradeHistory {
                market: market.clone(),
                start: config.start,
            };
            let trades = load_trades_with_timeout(
                connector.trade_loader(),
                &trade_input,
                market,
                config.start,
                Some(config.end),
                timeout,
            )
            .await?;
            debug!(market = %market, trades = trades.len(), "loaded trade history");

            context.update_input(candle_input.clone(), Value::Candles(candles.prefix(0)));
            context.update_input(trade_input, Value::Trades(trades.prefix(0)));
            context.update_input(
                Input::SimulatedOpenOrders(market.clone()),
                Value::Orders(Vec::new()),
            );
            context.update_input(
                Input::OrderSnapshotHistory(market.clone()),
                Value::TrackingEvents(sirocco_core::data::IncrementalSeries::new()),
            );

            sources.push((
                candle_input,
                TimedUpdateStream::candle_events(&candles, config.start, config.end),
            ));

            // The marketplace is the sole runtime writer of the trade
            // history input; loaded own trades are released through it as
            // simulated time reaches them.
            marketplaces.insert(
                market.clone(),
                CandleMarketplace::new(
                    market.clone(),
                    config.order_constraints,
                    config.fee_level,
                    config.volume_reduction,
                    config.start,
                )?
                .with_loaded_history(trades),
            );
            tracking.insert(market.clone(), TrackingRegistry::new());
        }

        let stream = TimedUpdateStream::new(sources);
        let environment = SimulationEnvironment::new(context, marketplaces, stream);
        let logger = ChartDataLogger::new(resolution, bot.chart_series.clone());

        Ok(Self {
            bot,
            environment,
            logger,
            tracking,
        })
    }

    /// Replays the whole interval and returns the chart artifact.
    pub fn run(&mut self) -> Result<ChartData, SimulationError> {
        let mut ticks: u64 = 0;
        while let Some(update) = self.environment.advance()? {
            self.tick(&update)?;
            ticks += 1;
        }
        info!(bot = %self.bot.name, ticks, "simulation completed");
        Ok(self.logger.data().clone())
    }

    /// One tick: bot re-evaluation, operation dispatch, tracking ingest,
    /// logger snapshot. The input update and marketplace matching already
    /// happened in [`SimulationEnvironment::advance`].
    fn tick(&mut self, update: &InputUpdate) -> Result<(), SimulationError> {
        let output = self.environment.evaluate(&self.bot.eval)?;
        let requests = match output {
            Value::OperationRequests(requests) => requests,
            Value::None => Vec::new(),
            other => {
                return Err(SimulationError::Eval {
                    name: self.bot.eval.name(),
                    reason: format!(
                        "bot eval must produce operation requests, got '{}'",
                        other.type_name()
                    ),
                })
            }
        };
        for request in &requests {
            let completed = self.environment.dispatch(request, update.time);
            if !completed.outcome.is_accepted() {
                warn!(bot = %self.bot.name, ?completed, "operation rejected");
            }
        }

        for (market, registry) in &mut self.tracking {
            let input = Input::OrderSnapshotHistory(market.clone());
            let Some(Value::TrackingEvents(log)) = self.environment.context().binding(&input)
            else {
                continue;
            };
            let log = log.clone();
            for order_id in registry.ingest(&log) {
                if let Some(error) = registry
                    .state(&order_id)
                    .and_then(BasicOrderTrackingState::error_state)
                {
                    warn!(%market, %order_id, %error, "order tracking inconsistency");
                }
            }
        }

        if let (Input::CandleHistory { market, .. }, Value::Candles(segment)) =
            (&update.input, &update.value)
        {
            let market = market.clone();
            if let Some(candle) = segment.last() {
                let candle = candle.clone();
                self.logger
                    .observe_candle(&mut self.environment, &market, &candle)?;
            }
        }
        Ok(())
    }

    /// The environment, for inspection between or after runs.
    #[must_use]
    pub fn environment(&self) -> &SimulationEnvironment {
        &self.environment
    }

    /// Tracking state of one order.
    #[must_use]
    pub fn tracking_state(
        &self,
        market: &Market,
        order_id: &OrderId,
    ) -> Option<&BasicOrderTrackingState> {
        self.tracking.get(market)?.state(order_id)
    }
}
