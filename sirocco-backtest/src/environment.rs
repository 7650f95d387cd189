//! Simulation environment.
//!
//! Owns the evaluation context, the per-market marketplaces and the
//! timed update stream. One call to [`advance`](SimulationEnvironment::advance)
//! consumes one stream event, applies it to the context and lets every
//! marketplace react, in a deterministic market order.

use std::collections::BTreeMap;

use sirocco_core::data::IncrementalSeries;
use sirocco_core::types::{Market, Timestamp};

use crate::context::{Context, Eval};
use crate::error::{InvalidOrder, SimulationError};
use crate::input::{Input, Value};
use crate::marketplace::CandleMarketplace;
use crate::operation::{CompletedOperation, OperationOutcome, OperationRequest};
use crate::stream::{InputUpdate, TimedUpdateStream};

/// Holds the context and marketplaces; advances simulated time.
pub struct SimulationEnvironment {
    context: Context,
    marketplaces: BTreeMap<Market, CandleMarketplace>,
    stream: TimedUpdateStream,
}

impl SimulationEnvironment {
    /// Creates an environment over a prepared context, marketplaces and
    /// update stream.
    #[must_use]
    pub fn new(
        context: Context,
        marketplaces: BTreeMap<Market, CandleMarketplace>,
        stream: TimedUpdateStream,
    ) -> Self {
        Self {
            context,
            marketplaces,
            stream,
        }
    }

    /// Consumes the next update event: applies it to the context, then
    /// lets every marketplace process it in ascending market order.
    ///
    /// Returns `Ok(None)` when the stream is exhausted.
    pub fn advance(&mut self) -> Result<Option<InputUpdate>, SimulationError> {
        let Some(update) = self.stream.next_update() else {
            return Ok(None);
        };
        self.context
            .update_input(update.input.clone(), update.value.clone());
        for marketplace in self.marketplaces.values_mut() {
            marketplace.process_update(&mut self.context, &update)?;
        }
        Ok(Some(update))
    }

    /// Evaluates through the owned context.
    pub fn evaluate(&mut self, eval: &Eval) -> Result<Value, SimulationError> {
        self.context.evaluate(eval)
    }

    /// Read access to the owned context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The marketplace simulating `market`, if any.
    #[must_use]
    pub fn marketplace(&self, market: &Market) -> Option<&CandleMarketplace> {
        self.marketplaces.get(market)
    }

    /// Dispatches one operation request to its marketplace and records the
    /// completed request in the session log input.
    ///
    /// Rejections are recorded, not raised; the returned operation carries
    /// the outcome.
    pub fn dispatch(&mut self, request: &OperationRequest, time: Timestamp) -> CompletedOperation {
        let outcome = match self.marketplaces.get_mut(request.market()) {
            None => OperationOutcome::Rejected(InvalidOrder::UnknownMarket(
                request.market().clone(),
            )),
            Some(marketplace) => match request {
                OperationRequest::PlaceOrder { spec, .. } => {
                    match marketplace.place_order(&mut self.context, spec, time) {
                        Ok(order) => OperationOutcome::Accepted { order: Some(order) },
                        Err(rejection) => OperationOutcome::Rejected(rejection),
                    }
                }
                OperationRequest::CancelOrder {
                    order_id,
                    absolute_rest,
                    ..
                } => {
                    match marketplace.cancel_order(
                        &mut self.context,
                        order_id,
                        time,
                        *absolute_rest,
                    ) {
                        Ok(_) => OperationOutcome::Accepted { order: None },
                        Err(rejection) => OperationOutcome::Rejected(rejection),
                    }
                }
            },
        };

        let completed = CompletedOperation {
            time,
            request: request.clone(),
            outcome,
        };
        self.record_completed(completed.clone());
        completed
    }

    fn record_completed(&mut self, operation: CompletedOperation) {
        let input = Input::CompletedOperationRequests;
        let mut log = match self.context.binding(&input) {
            Some(Value::Operations(log)) => log.clone(),
            _ => IncrementalSeries::new(),
        };
        log.push(operation);
        self.context.update_input(input, Value::Operations(log));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sirocco_core::data::{
        Candle, CandleHistorySegment, OrderConstraints, Precision,
    };
    use sirocco_core::types::{Amount, CandleLength, Price, Quantity};

    use crate::operation::OrderSpec;

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

    fn environment() -> SimulationEnvironment {
        let segment = CandleHistorySegment::from_candles(
            Timestamp::ZERO,
            CandleLength::MINUTE_1,
            vec![candle(0), candle(60_000)],
        )
        .unwrap();
        let candle_input = Input::CandleHistory {
            market: market(),
            candle_length: CandleLength::MINUTE_1,
            start: Timestamp::ZERO,
        };
        let stream = TimedUpdateStream::new(vec![(
            candle_input,
            TimedUpdateStream::candle_events(
                &segment,
                Timestamp::ZERO,
                Timestamp::new_unchecked(120_000),
            ),
        )]);

        let marketplace = CandleMarketplace::new(
            market(),
            OrderConstraints {
                price_precision: Precision::DecimalPlaces(2),
                quantity_precision: Precision::DecimalPlaces(4),
            },
            dec!(0),
            dec!(1),
            Timestamp::ZERO,
        )
        .unwrap();
        let mut marketplaces = BTreeMap::new();
        marketplaces.insert(market(), marketplace);

        SimulationEnvironment::new(Context::new(), marketplaces, stream)
    }

    #[test]
    fn test_advance_applies_updates_until_exhausted() {
        let mut env = environment();
        let first = env.advance().unwrap().unwrap();
        assert_eq!(first.time.as_millis(), 60_000);
        let second = env.advance().unwrap().unwrap();
        assert_eq!(second.time.as_millis(), 120_000);
        assert!(env.advance().unwrap().is_none());
    }

    #[test]
    fn test_dispatch_place_and_candle_fill() {
        let mut env = environment();
        let request = OperationRequest::PlaceOrder {
            market: market(),
            spec: OrderSpec::buy(
                Quantity::new_unchecked(dec!(1)),
                Price::new_unchecked(dec!(100)),
            ),
        };
        let completed = env.dispatch(&request, Timestamp::ZERO);
        assert!(completed.outcome.is_accepted());

        // The next candle crosses the order's price and fills it.
        env.advance().unwrap().unwrap();
        let marketplace = env.marketplace(&market()).unwrap();
        assert!(marketplace.open_orders().is_empty());

        // The completed-operations log recorded the placement.
        let Some(Value::Operations(log)) =
            env.context().binding(&Input::CompletedOperationRequests)
        else {
            panic!("expected operations log");
        };
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_dispatch_rejects_unknown_market() {
        let mut env = environment();
        let request = OperationRequest::CancelOrder {
            market: "kraken:BTC-USD".parse().unwrap(),
            order_id: sirocco_core::types::OrderId::new("o-1").unwrap(),
            absolute_rest: None,
        };
        let completed = env.dispatch(&request, Timestamp::ZERO);
        assert!(matches!(
            completed.outcome,
            OperationOutcome::Rejected(InvalidOrder::UnknownMarket(_))
        ));
    }
}
