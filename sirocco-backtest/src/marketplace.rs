//! Candle-simulator marketplace.
//!
//! Per-market simulated order book and matcher. Orders are matched
//! against OHLC candles at candle granularity: a limit order fills at its
//! own price whenever the candle's range crosses it, bounded by the
//! candle's volume budget. Fills are stamped with the candle's close
//! time, which keeps the simulation deterministic and replayable.
//!
//! The marketplace mutates exactly the context inputs it owns: the open
//! simulated orders, the own-trade history and the order snapshot
//! history.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use tracing::debug;

use sirocco_core::data::{Candle, IncrementalSeries, Order, OrderConstraints, OrderSide, Trade, TradeHistorySegment};
use sirocco_core::types::{Amount, Market, OrderId, Price, Quantity, Timestamp, TradeId};

use crate::context::Context;
use crate::error::{InvalidOrder, SimulationError};
use crate::input::{Input, Value};
use crate::operation::OrderSpec;
use crate::stream::InputUpdate;
use crate::tracking::OrderTrackingEvent;

/// Per-market simulated order book and matcher.
pub struct CandleMarketplace {
    market: Market,
    constraints: OrderConstraints,
    fee_level: Decimal,
    volume_reduction: Decimal,
    session_start: Timestamp,
    open_orders: BTreeMap<OrderId, Order>,
    next_order_id: u64,
    next_trade_id: u64,
    candles_processed: usize,
    loaded_trades: Vec<Trade>,
    released: usize,
}

impl CandleMarketplace {
    /// Creates a marketplace for one market.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfig` if the fee level is
    /// negative or the volume reduction is outside `(0, 1]`.
    pub fn new(
        market: Market,
        constraints: OrderConstraints,
        fee_level: Decimal,
        volume_reduction: Decimal,
        session_start: Timestamp,
    ) -> Result<Self, SimulationError> {
        if fee_level < Decimal::ZERO {
            return Err(SimulationError::InvalidConfig(format!(
                "fee level must be non-negative, got {fee_level}"
            )));
        }
        if volume_reduction <= Decimal::ZERO || volume_reduction > Decimal::ONE {
            return Err(SimulationError::InvalidConfig(format!(
                "volume reduction must be in (0, 1], got {volume_reduction}"
            )));
        }
        Ok(Self {
            market,
            constraints,
            fee_level,
            volume_reduction,
            session_start,
            open_orders: BTreeMap::new(),
            next_order_id: 0,
            next_trade_id: 0,
            candles_processed: 0,
            loaded_trades: Vec::new(),
            released: 0,
        })
    }

    /// Hands loaded own-trade history to the marketplace.
    ///
    /// The marketplace is the sole runtime writer of the trade history
    /// input: it releases these trades into the bound segment as
    /// simulated time reaches them, interleaved append-only with its own
    /// fills.
    #[must_use]
    pub fn with_loaded_history(mut self, history: TradeHistorySegment) -> Self {
        self.loaded_trades = history.as_slice().to_vec();
        self.released = 0;
        self
    }

    /// The market this marketplace simulates.
    #[must_use]
    pub fn market(&self) -> &Market {
        &self.market
    }

    /// Currently open simulated orders, ascending by order id.
    #[must_use]
    pub fn open_orders(&self) -> Vec<&Order> {
        self.open_orders.values().collect()
    }

    /// The open-orders input owned by this marketplace.
    #[must_use]
    pub fn open_orders_input(&self) -> Input {
        Input::SimulatedOpenOrders(self.market.clone())
    }

    /// The order snapshot history input owned by this marketplace.
    #[must_use]
    pub fn snapshot_input(&self) -> Input {
        Input::OrderSnapshotHistory(self.market.clone())
    }

    /// The trade history input owned by this marketplace.
    #[must_use]
    pub fn trade_input(&self) -> Input {
        Input::TradeHistory {
            market: self.market.clone(),
            start: self.session_start,
        }
    }

    fn next_order_id(&mut self) -> OrderId {
        self.next_order_id += 1;
        OrderId::new(format!(
            "sim-{}-{}-{}-{:08}",
            self.market.exchange, self.market.pair.base, self.market.pair.quote, self.next_order_id
        ))
        .expect("generated order id is non-empty")
    }

    fn next_trade_id(&mut self) -> TradeId {
        self.next_trade_id += 1;
        TradeId::new(format!(
            "simt-{}-{}-{}-{:08}",
            self.market.exchange, self.market.pair.base, self.market.pair.quote, self.next_trade_id
        ))
        .expect("generated trade id is non-empty")
    }

    /// Places a simulated order.
    ///
    /// Price and quantity are quantized to the market's constraints before
    /// acceptance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrder` if the quantity quantizes to zero or its
    /// sign disagrees with the declared side. Not fatal to the simulation.
    pub fn place_order(
        &mut self,
        context: &mut Context,
        spec: &OrderSpec,
        time: Timestamp,
    ) -> Result<Order, InvalidOrder> {
        if spec.quantity.is_zero() {
            return Err(InvalidOrder::ZeroQuantity {
                quantity: spec.quantity,
            });
        }
        if OrderSide::of(spec.quantity) != Some(spec.side) {
            return Err(InvalidOrder::SideMismatch {
                quantity: spec.quantity,
            });
        }
        let price = Price::new_unchecked(
            self.constraints
                .price_precision
                .quantize(spec.price.as_decimal()),
        );
        let quantity = Quantity::new_unchecked(
            self.constraints
                .quantity_precision
                .quantize(spec.quantity.as_decimal()),
        );
        if quantity.is_zero() {
            return Err(InvalidOrder::ZeroQuantity {
                quantity: spec.quantity,
            });
        }

        let order = Order::open(self.next_order_id(), self.market.clone(), quantity, price)?;
        self.open_orders.insert(order.id.clone(), order.clone());
        debug!(market = %self.market, order = %order.id, %quantity, %price, "placed simulated order");

        self.push_tracking(
            context,
            OrderTrackingEvent::Creation {
                time,
                order: order.clone(),
            },
        );
        self.push_tracking(
            context,
            OrderTrackingEvent::ObservationChange {
                time,
                order_id: order.id.clone(),
                order: Some(order.clone()),
            },
        );
        self.sync_open_orders(context);
        Ok(order)
    }

    /// Cancels an open simulated order and returns it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrder::UnknownOrder` if no open order has this id.
    pub fn cancel_order(
        &mut self,
        context: &mut Context,
        order_id: &OrderId,
        time: Timestamp,
        absolute_rest: Option<Quantity>,
    ) -> Result<Order, InvalidOrder> {
        let order = self
            .open_orders
            .remove(order_id)
            .ok_or_else(|| InvalidOrder::UnknownOrder(order_id.clone()))?;
        debug!(market = %self.market, order = %order_id, "canceled simulated order");

        self.push_tracking(
            context,
            OrderTrackingEvent::Cancel {
                time,
                order_id: order_id.clone(),
                absolute_rest,
            },
        );
        self.push_tracking(
            context,
            OrderTrackingEvent::ObservationChange {
                time,
                order_id: order_id.clone(),
                order: None,
            },
        );
        self.sync_open_orders(context);
        Ok(order)
    }

    /// Reacts to one stream event: loaded trades whose time has arrived
    /// are released first, then new candles for this market are matched
    /// against the open orders.
    pub fn process_update(
        &mut self,
        context: &mut Context,
        update: &InputUpdate,
    ) -> Result<(), SimulationError> {
        self.release_history(context, update.time)?;
        let Input::CandleHistory { market, .. } = &update.input else {
            return Ok(());
        };
        if *market != self.market {
            return Ok(());
        }
        let Value::Candles(segment) = &update.value else {
            return Ok(());
        };
        let candles: Vec<Candle> = segment
            .as_slice()
            .get(self.candles_processed..)
            .unwrap_or_default()
            .to_vec();
        self.candles_processed = segment.len();
        for candle in &candles {
            self.process_candle(context, candle)?;
        }
        Ok(())
    }

    /// Matches every open order against one candle.
    ///
    /// Orders are scanned ascending by id. All fills of one candle share
    /// its volume budget, so the same candle cannot overfill both sides.
    pub fn process_candle(
        &mut self,
        context: &mut Context,
        candle: &Candle,
    ) -> Result<(), SimulationError> {
        let mut budget = candle.quote_volume.as_decimal() * self.volume_reduction;
        let ids: Vec<OrderId> = self.open_orders.keys().cloned().collect();
        let mut changed = false;

        for id in ids {
            let Some(order) = self.open_orders.get(&id).cloned() else {
                continue;
            };
            let crosses = match order.side() {
                OrderSide::Buy => candle.low <= order.price,
                OrderSide::Sell => candle.high >= order.price,
            };
            if !crosses {
                continue;
            }
            let price = order.price.as_decimal();
            if price.is_zero() || budget <= Decimal::ZERO {
                continue;
            }

            let affordable = budget / price;
            let open_magnitude = order.open_quantity().abs().as_decimal();
            let fill_magnitude = self
                .constraints
                .quantity_precision
                .quantize(open_magnitude.min(affordable));
            if fill_magnitude <= Decimal::ZERO {
                continue;
            }

            let trade_time = candle.close_time();
            let quantity =
                Quantity::new_unchecked(fill_magnitude).with_sign_of(order.full_quantity);
            let trade = Trade {
                id: self.next_trade_id(),
                time: trade_time,
                market: self.market.clone(),
                price: order.price,
                quantity,
                fees: Amount::new_unchecked(fill_magnitude * price * self.fee_level),
                order_id: Some(id.clone()),
            };
            debug!(
                market = %self.market,
                order = %id,
                quantity = %trade.quantity,
                price = %trade.price,
                "simulated fill"
            );

            self.append_trade(context, trade.clone())?;
            self.push_tracking(context, OrderTrackingEvent::NewTrade(trade));
            budget -= fill_magnitude * price;

            let updated = order.reduce_quantity(Quantity::new_unchecked(fill_magnitude))?;
            if updated.is_filled() {
                self.open_orders.remove(&id);
                self.push_tracking(
                    context,
                    OrderTrackingEvent::ObservationChange {
                        time: trade_time,
                        order_id: id,
                        order: None,
                    },
                );
            } else {
                self.open_orders.insert(id, updated);
            }
            changed = true;
        }

        if changed {
            self.sync_open_orders(context);
        }
        Ok(())
    }

    fn release_history(
        &mut self,
        context: &mut Context,
        time: Timestamp,
    ) -> Result<(), SimulationError> {
        while let Some(trade) = self.loaded_trades.get(self.released) {
            if trade.time > time {
                break;
            }
            let trade = trade.clone();
            self.released += 1;
            self.append_trade(context, trade)?;
        }
        Ok(())
    }

    fn append_trade(&self, context: &mut Context, trade: Trade) -> Result<(), SimulationError> {
        let input = self.trade_input();
        let mut segment = match context.binding(&input) {
            Some(Value::Trades(segment)) => segment.clone(),
            _ => TradeHistorySegment::new(self.session_start),
        };
        segment.push(trade)?;
        context.update_input(input, Value::Trades(segment));
        Ok(())
    }

    fn push_tracking(&self, context: &mut Context, event: OrderTrackingEvent) {
        let input = self.snapshot_input();
        let mut log = match context.binding(&input) {
            Some(Value::TrackingEvents(log)) => log.clone(),
            _ => IncrementalSeries::new(),
        };
        log.push(event);
        context.update_input(input, Value::TrackingEvents(log));
    }

    fn sync_open_orders(&self, context: &mut Context) {
        let orders: Vec<Order> = self.open_orders.values().cloned().collect();
        context.update_input(self.open_orders_input(), Value::Orders(orders));
    }
}
