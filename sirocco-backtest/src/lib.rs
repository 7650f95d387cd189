//! # Sirocco Backtest
//!
//! Deterministic back-testing simulation core for the Sirocco trading
//! system.
//!
//! This crate provides:
//! - An incremental evaluation context: memoized pure computations over
//!   mutable input bindings, with precise invalidation
//! - A timed input update stream merging per-input event sequences into a
//!   single monotonic replay timeline
//! - A simulation environment advancing simulated time tick by tick
//! - A candle-simulator marketplace matching orders against OHLC data
//! - An order tracking state machine reconciling creations, cancels,
//!   observations and trades
//! - A chart data logger sinking per-candle metric snapshots
//!
//! The core is single-threaded and deterministic: replaying the same
//! inputs twice produces identical artifacts. Only the initial history
//! loads may suspend; the replay loop itself performs no I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

/// Bot descriptor consumed by the simulation driver.
pub mod bot;
/// Chart data logger and artifact.
pub mod chart;
/// Incremental evaluation context.
pub mod context;
/// Simulation environment.
pub mod environment;
mod error;
/// Input identifiers and bound values.
pub mod input;
/// History loader seams.
pub mod loader;
/// Candle-simulator marketplace.
pub mod marketplace;
/// Order operation requests and outcomes.
pub mod operation;
/// Simulation driver and configuration.
pub mod simulation;
/// Timed input update stream.
pub mod stream;
/// Order tracking state.
pub mod tracking;

pub use error::{InvalidOrder, SimulationError};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bot::Bot;
    pub use crate::chart::{ChartData, ChartDataLogger, ChartSeriesConfig, NamedEval};
    pub use crate::context::{Context, Eval, EvalFailure};
    pub use crate::environment::SimulationEnvironment;
    pub use crate::error::{InvalidOrder, SimulationError};
    pub use crate::input::{Input, SeqItem, Value};
    pub use crate::loader::{
        CandleHistoryLoader, ExchangeConnector, ExchangeConnectorProvider, LoaderError,
        MemoryConnector, MemoryConnectorProvider, TradeHistoryLoader,
    };
    pub use crate::marketplace::CandleMarketplace;
    pub use crate::operation::{
        CompletedOperation, OperationOutcome, OperationRequest, OrderSpec,
    };
    pub use crate::simulation::{Simulation, SimulationConfig};
    pub use crate::stream::{InputUpdate, TimedUpdateStream};
    pub use crate::tracking::{
        BasicOrderTrackingState, Observation, OrderTrackingError, OrderTrackingEvent,
        SyncReason, TrackingRegistry,
    };
}
