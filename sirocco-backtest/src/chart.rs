//! Chart data logger.
//!
//! Aggregates the bot's basic candles to a coarser interval and, at each
//! aggregated candle boundary, reads a configured set of named evals:
//! `candle_start_evals` at the aggregated open, `candle_end_evals` at the
//! close. The artifact is an in-memory per-market timeseries; writing it
//! anywhere is the embedder's business.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use sirocco_core::data::Candle;
use sirocco_core::types::{CandleLength, Market, Timestamp};

use crate::context::Eval;
use crate::environment::SimulationEnvironment;
use crate::error::SimulationError;
use crate::input::Value;

/// An eval with the series name its values are recorded under.
#[derive(Debug, Clone)]
pub struct NamedEval {
    /// Series name
    pub name: String,
    /// Eval producing the metric
    pub eval: Eval,
}

impl NamedEval {
    /// Creates a named eval.
    #[must_use]
    pub fn new(name: impl Into<String>, eval: Eval) -> Self {
        Self {
            name: name.into(),
            eval,
        }
    }
}

/// Configuration of one chart series group.
#[derive(Debug, Clone)]
pub struct ChartSeriesConfig {
    /// Group name, prefixed to every series key
    pub name: String,
    /// Aggregation factor over the bot's basic candle length
    pub aggregation_factor: u32,
    /// Evals read at each aggregated candle's open
    pub candle_start_evals: Vec<NamedEval>,
    /// Evals read at each aggregated candle's close
    pub candle_end_evals: Vec<NamedEval>,
}

/// One recorded metric value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    /// Boundary time the value was read at
    pub time: Timestamp,
    /// The metric value
    pub value: Decimal,
}

/// Timeseries recorded for one market, keyed by `group/series`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketChartData {
    /// Points per series key
    pub series: BTreeMap<String, Vec<ChartPoint>>,
}

/// The final chart artifact, keyed by market display name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    /// Per-market timeseries
    pub markets: BTreeMap<String, MarketChartData>,
}

/// Sinks per-tick evaluation results into a chart artifact.
pub struct ChartDataLogger {
    basic_length: CandleLength,
    configs: Vec<ChartSeriesConfig>,
    data: ChartData,
}

impl ChartDataLogger {
    /// Creates a logger over the bot's series configuration.
    #[must_use]
    pub fn new(basic_length: CandleLength, configs: Vec<ChartSeriesConfig>) -> Self {
        Self {
            basic_length,
            configs,
            data: ChartData::default(),
        }
    }

    /// Reacts to one closed basic candle: records start evals when the
    /// candle opens an aggregated interval, and end evals when it closes
    /// one.
    pub fn observe_candle(
        &mut self,
        environment: &mut SimulationEnvironment,
        market: &Market,
        candle: &Candle,
    ) -> Result<(), SimulationError> {
        for config_index in 0..self.configs.len() {
            let config = self.configs[config_index].clone();
            let aggregated = self.basic_length.scaled(config.aggregation_factor);

            if candle.start_time.is_aligned_to(aggregated) {
                for named in &config.candle_start_evals {
                    self.record(environment, market, &config.name, named, candle.start_time)?;
                }
            }
            if candle.close_time().is_aligned_to(aggregated) {
                for named in &config.candle_end_evals {
                    self.record(environment, market, &config.name, named, candle.close_time())?;
                }
            }
        }
        Ok(())
    }

    fn record(
        &mut self,
        environment: &mut SimulationEnvironment,
        market: &Market,
        group: &str,
        named: &NamedEval,
        time: Timestamp,
    ) -> Result<(), SimulationError> {
        let value = match environment.evaluate(&named.eval)? {
            Value::Decimal(value) => value,
            Value::Bool(value) => {
                if value {
                    Decimal::ONE
                } else {
                    Decimal::ZERO
                }
            }
            Value::Time(time) => Decimal::from(time.as_millis()),
            Value::None => return Ok(()),
            other => {
                return Err(SimulationError::Eval {
                    name: named.name.clone(),
                    reason: format!(
                        "chart eval produced non-numeric value '{}'",
                        other.type_name()
                    ),
                })
            }
        };

        self.data
            .markets
            .entry(market.to_string())
            .or_default()
            .series
            .entry(format!("{group}/{}", named.name))
            .or_default()
            .push(ChartPoint { time, value });
        Ok(())
    }

    /// The artifact recorded so far.
    #[must_use]
    pub fn data(&self) -> &ChartData {
        &self.data
    }

    /// Consumes the logger, returning the artifact.
    #[must_use]
    pub fn into_data(self) -> ChartData {
        self.data
    }
}
