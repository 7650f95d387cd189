//! Order tracking state.
//!
//! Live exchange observations, cancels and own-trade feeds arrive
//! asynchronously and may reorder. Per order id, this module aggregates
//! every event seen for that id and derives a reporting state, an error
//! state for impossible histories, and a set of sync reasons explaining
//! why an order is not yet settled. Sync reasons are the bot's signal to
//! wait rather than act.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use sirocco_core::data::{IncrementalSeries, Order, Trade};
use sirocco_core::types::{OrderId, Quantity, Timestamp};

/// A snapshot of an order as seen from an exchange feed.
///
/// `order` is present while the order is open and absent once it is gone
/// (or before it was first seen).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Time of the snapshot
    pub time: Timestamp,
    /// The observed order, if open
    pub order: Option<Order>,
}

/// A single event in the tracking stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderTrackingEvent {
    /// An order was created
    Creation {
        /// Creation time
        time: Timestamp,
        /// The created order
        order: Order,
    },
    /// An order was canceled
    Cancel {
        /// Cancellation time
        time: Timestamp,
        /// The canceled order
        order_id: OrderId,
        /// Known unfilled magnitude at cancellation, if reported
        absolute_rest: Option<Quantity>,
    },
    /// An own trade was recorded
    NewTrade(Trade),
    /// The observed snapshot of an order changed
    ObservationChange {
        /// Time of the snapshot
        time: Timestamp,
        /// Order the snapshot belongs to
        order_id: OrderId,
        /// The observed order, if open
        order: Option<Order>,
    },
}

impl OrderTrackingEvent {
    /// Time the event happened at.
    #[must_use]
    pub fn time(&self) -> Timestamp {
        match self {
            Self::Creation { time, .. }
            | Self::Cancel { time, .. }
            | Self::ObservationChange { time, .. } => *time,
            Self::NewTrade(trade) => trade.time,
        }
    }

    /// Order id the event belongs to, if attributable.
    #[must_use]
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            Self::Creation { order, .. } => Some(&order.id),
            Self::Cancel { order_id, .. } | Self::ObservationChange { order_id, .. } => {
                Some(order_id)
            }
            Self::NewTrade(trade) => trade.order_id.as_ref(),
        }
    }
}

/// Impossible event history for one order.
///
/// Surfaced per order id; does not abort the simulation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderTrackingError {
    /// Two events contradict each other
    #[error("inconsistent events: {first:?} vs {second:?}")]
    InconsistentEvents {
        /// Earlier of the contradicting events
        first: Box<OrderTrackingEvent>,
        /// Later of the contradicting events
        second: Box<OrderTrackingEvent>,
    },

    /// An order observed as gone was observed open again later
    #[error("order reappeared in observation at {time}")]
    ReappearingOrder {
        /// Time of the reappearing observation
        time: Timestamp,
        /// The reappearing order
        order: Order,
    },

    /// Recorded trades exceed what the order can fill
    #[error("order overfilled: traded {total_fill}, maximum {max_fill}")]
    Overfill {
        /// Most recent trade
        last_trade: Box<Trade>,
        /// Signed total traded quantity
        total_fill: Quantity,
        /// Maximum fillable magnitude
        max_fill: Quantity,
    },
}

/// A non-error explanation for a not-yet-settled order state.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncReason {
    /// The order is gone and nothing explains why
    UnknownWhyOrderIsGone {
        /// Time of the last relevant event
        time: Timestamp,
    },
    /// Events imply trades the own-trade feed has not delivered yet
    ExpectingTrades {
        /// Time of the implying event
        time: Timestamp,
        /// Signed quantity still expected
        quantity: Quantity,
    },
    /// The observed snapshot lags behind recorded trades or a cancel
    ExpectingObservationChange {
        /// Time of the event the observation lags behind
        time: Timestamp,
        /// Expected next snapshot (`None` = expected to disappear)
        expected: Option<Order>,
    },
    /// A cancel without a rest quantity leaves the final fill unknown
    UnknownIfMoreTradesBeforeCancel {
        /// Cancellation time
        time: Timestamp,
    },
}

/// Aggregated tracking state for one order id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicOrderTrackingState {
    operation_events: Vec<OrderTrackingEvent>,
    observation_events: Vec<OrderTrackingEvent>,
    trades: Vec<Trade>,
}

impl BasicOrderTrackingState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from an event iterator.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a OrderTrackingEvent>) -> Self {
        let mut state = Self::new();
        for event in events {
            state.push_event(event);
        }
        state
    }

    /// Records one event.
    pub fn push_event(&mut self, event: &OrderTrackingEvent) {
        match event {
            OrderTrackingEvent::Creation { .. } | OrderTrackingEvent::Cancel { .. } => {
                self.operation_events.push(event.clone());
            }
            OrderTrackingEvent::NewTrade(trade) => self.trades.push(trade.clone()),
            OrderTrackingEvent::ObservationChange { .. } => {
                self.observation_events.push(event.clone());
            }
        }
    }

    /// Operation events (creations and cancels) in arrival order.
    #[must_use]
    pub fn operation_events(&self) -> &[OrderTrackingEvent] {
        &self.operation_events
    }

    /// Observation history in arrival order.
    #[must_use]
    pub fn observations(&self) -> Vec<Observation> {
        self.observation_changes()
            .map(|(_, time, order)| Observation {
                time,
                order: order.cloned(),
            })
            .collect()
    }

    /// Recorded own trades in arrival order.
    #[must_use]
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    fn creations(&self) -> impl Iterator<Item = (&OrderTrackingEvent, Timestamp, &Order)> {
        self.operation_events.iter().filter_map(|event| match event {
            OrderTrackingEvent::Creation { time, order } => Some((event, *time, order)),
            _ => None,
        })
    }

    fn cancels(
        &self,
    ) -> impl Iterator<Item = (&OrderTrackingEvent, Timestamp, Option<Quantity>)> {
        self.operation_events.iter().filter_map(|event| match event {
            OrderTrackingEvent::Cancel {
                time,
                absolute_rest,
                ..
            } => Some((event, *time, *absolute_rest)),
            _ => None,
        })
    }

    fn observation_changes(
        &self,
    ) -> impl Iterator<Item = (&OrderTrackingEvent, Timestamp, Option<&Order>)> {
        self.observation_events
            .iter()
            .filter_map(|event| match event {
                OrderTrackingEvent::ObservationChange { time, order, .. } => {
                    Some((event, *time, order.as_ref()))
                }
                _ => None,
            })
    }

    fn present_observations(
        &self,
    ) -> impl Iterator<Item = (&OrderTrackingEvent, Timestamp, &Order)> {
        self.observation_changes()
            .filter_map(|(event, time, order)| order.map(|o| (event, time, o)))
    }

    /// The order currently observed as open, if any.
    #[must_use]
    pub fn currently_observed(&self) -> Option<&Order> {
        self.observation_changes()
            .last()
            .and_then(|(_, _, order)| order)
    }

    /// The order with its full quantity: the first present observation,
    /// else the created order.
    #[must_use]
    pub fn order_with_full_quantity(&self) -> Option<&Order> {
        self.present_observations()
            .map(|(_, _, order)| order)
            .next()
            .or_else(|| self.creations().map(|(_, _, order)| order).next())
    }

    /// Signed sum of recorded trade quantities.
    #[must_use]
    pub fn total_trade_quantity(&self) -> Quantity {
        self.trades.iter().map(|trade| trade.quantity).sum()
    }

    /// First violated consistency rule, if any.
    ///
    /// Rules are checked in a fixed order; the first hit wins.
    #[must_use]
    pub fn error_state(&self) -> Option<OrderTrackingError> {
        self.check_consistent_full_quantity()
            .or_else(|| self.check_creation_matches_observations())
            .or_else(|| self.check_cancels_consistent())
            .or_else(|| self.check_order_does_not_reappear())
            .or_else(|| self.check_order_not_overfilled())
    }

    /// Present observations must agree on the full quantity, and the open
    /// quantity must never grow.
    fn check_consistent_full_quantity(&self) -> Option<OrderTrackingError> {
        let present: Vec<(&OrderTrackingEvent, Timestamp, &Order)> =
            self.present_observations().collect();
        for pair in present.windows(2) {
            let (first_event, _, a) = pair[0];
            let (second_event, _, b) = pair[1];
            if a.full_quantity != b.full_quantity
                || a.open_quantity().abs() < b.open_quantity().abs()
            {
                return Some(OrderTrackingError::InconsistentEvents {
                    first: Box::new(first_event.clone()),
                    second: Box::new(second_event.clone()),
                });
            }
        }
        None
    }

    /// At most one creation; a created order must match what is observed.
    fn check_creation_matches_observations(&self) -> Option<OrderTrackingError> {
        let creations: Vec<(&OrderTrackingEvent, Timestamp, &Order)> = self.creations().collect();
        if let [first, second, ..] = creations.as_slice() {
            return Some(OrderTrackingError::InconsistentEvents {
                first: Box::new(first.0.clone()),
                second: Box::new(second.0.clone()),
            });
        }
        let (creation_event, _, created) = creations.first()?;
        for (observation_event, _, observed) in self.present_observations() {
            if observed.full_quantity != created.full_quantity {
                return Some(OrderTrackingError::InconsistentEvents {
                    first: Box::new((*creation_event).clone()),
                    second: Box::new(observation_event.clone()),
                });
            }
        }
        None
    }

    /// At most one cancel; a reported rest quantity must fit every prior
    /// view of the order.
    fn check_cancels_consistent(&self) -> Option<OrderTrackingError> {
        let cancels: Vec<(&OrderTrackingEvent, Timestamp, Option<Quantity>)> =
            self.cancels().collect();
        if let [first, second, ..] = cancels.as_slice() {
            return Some(OrderTrackingError::InconsistentEvents {
                first: Box::new(first.0.clone()),
                second: Box::new(second.0.clone()),
            });
        }
        let (cancel_event, cancel_time, rest) = *cancels.first()?;
        let rest = rest?;
        for (event, time, order) in self.creations() {
            if time <= cancel_time && order.full_quantity.abs() < rest.abs() {
                return Some(OrderTrackingError::InconsistentEvents {
                    first: Box::new(event.clone()),
                    second: Box::new(cancel_event.clone()),
                });
            }
        }
        for (event, time, order) in self.present_observations() {
            if time <= cancel_time && order.full_quantity.abs() < rest.abs() {
                return Some(OrderTrackingError::InconsistentEvents {
                    first: Box::new(event.clone()),
                    second: Box::new(cancel_event.clone()),
                });
            }
        }
        None
    }

    /// After a present-then-absent transition, no later observation may be
    /// present again.
    fn check_order_does_not_reappear(&self) -> Option<OrderTrackingError> {
        let mut was_present = false;
        let mut gone = false;
        for (_, time, order) in self.observation_changes() {
            match order {
                Some(order) => {
                    if gone {
                        return Some(OrderTrackingError::ReappearingOrder {
                            time,
                            order: order.clone(),
                        });
                    }
                    was_present = true;
                }
                None => {
                    if was_present {
                        gone = true;
                    }
                }
            }
        }
        None
    }

    /// Total traded quantity must fit within the order's full quantity
    /// (less the cancel rest, when one was reported).
    fn check_order_not_overfilled(&self) -> Option<OrderTrackingError> {
        let full = self.order_with_full_quantity()?;
        let total = self.total_trade_quantity();
        let mut max_fill = full.full_quantity.abs();
        if let Some((_, _, Some(rest))) = self.cancels().next() {
            max_fill = max_fill - rest.abs();
        }
        if total.abs() > max_fill {
            return Some(OrderTrackingError::Overfill {
                last_trade: Box::new(self.trades.last()?.clone()),
                total_fill: total,
                max_fill,
            });
        }
        None
    }

    /// The order as it should currently be reported to the bot.
    ///
    /// Present only while the order is observed open and not canceled, and
    /// the recorded trades fit within the observed full quantity.
    #[must_use]
    pub fn reporting_state(&self) -> Option<Order> {
        let observed = self.currently_observed()?;
        if self.cancels().next().is_some() {
            return None;
        }
        let total = self.total_trade_quantity();
        if total.abs() > observed.full_quantity.abs() {
            return None;
        }
        observed.reset_quantity().reduce_quantity(total).ok()
    }

    /// Sync reasons explaining why the state is not yet settled.
    ///
    /// Empty when an error state is present, and empty once every feed
    /// agrees.
    #[must_use]
    pub fn sync_reasons(&self) -> Vec<SyncReason> {
        if self.error_state().is_some() {
            return Vec::new();
        }
        let mut reasons = Vec::new();
        let total = self.total_trade_quantity();
        let ever_present = self.present_observations().next().is_some();
        let cancel = self.cancels().next().map(|(_, time, rest)| (time, rest));

        if !ever_present && !self.trades.is_empty() && cancel.is_none() {
            if let Some(last_trade) = self.trades.last() {
                reasons.push(SyncReason::UnknownWhyOrderIsGone {
                    time: last_trade.time,
                });
            }
        } else if let Some((time, implied)) = self.implied_trade_quantity() {
            if implied.abs() > total.abs() {
                reasons.push(SyncReason::ExpectingTrades {
                    time,
                    quantity: implied - total,
                });
            }
        }

        if let Some(observed) = self.currently_observed() {
            if total.abs() > observed.filled_quantity.abs() {
                if let (Some(last_trade), Ok(expected)) = (
                    self.trades.last(),
                    observed.reset_quantity().reduce_quantity(total),
                ) {
                    reasons.push(SyncReason::ExpectingObservationChange {
                        time: last_trade.time,
                        expected: Some(expected),
                    });
                }
            } else if let Some((cancel_time, _)) = cancel {
                reasons.push(SyncReason::ExpectingObservationChange {
                    time: cancel_time,
                    expected: None,
                });
            }
        } else if ever_present && cancel.is_none() {
            let not_fully_traded = self
                .order_with_full_quantity()
                .is_some_and(|full| total.abs() < full.full_quantity.abs());
            if not_fully_traded {
                if let Some((_, time, _)) = self.observation_changes().last() {
                    reasons.push(SyncReason::UnknownWhyOrderIsGone { time });
                }
            }
        }

        if let Some((cancel_time, None)) = cancel {
            reasons.push(SyncReason::UnknownIfMoreTradesBeforeCancel { time: cancel_time });
        }

        reasons
    }

    /// Latest implied-but-not-yet-materialized trade quantity.
    ///
    /// Candidates: the fill implied by a cancel's rest quantity, and the
    /// fill reported by the last present observation. Equal magnitudes
    /// resolve to the earlier time; otherwise the greater magnitude wins.
    fn implied_trade_quantity(&self) -> Option<(Timestamp, Quantity)> {
        let from_cancel = self.cancels().next().and_then(|(_, time, rest)| {
            let rest = rest?;
            let full = self.order_with_full_quantity()?;
            let implied = (full.full_quantity.abs() - rest.abs()).with_sign_of(full.full_quantity);
            Some((time, implied))
        });
        let from_observation = self
            .present_observations()
            .last()
            .map(|(_, time, order)| (time, order.filled_quantity));

        match (from_cancel, from_observation) {
            (Some(cancel), Some(observation)) => {
                if cancel.1.abs() == observation.1.abs() {
                    if cancel.0 <= observation.0 {
                        Some(cancel)
                    } else {
                        Some(observation)
                    }
                } else if cancel.1.abs() > observation.1.abs() {
                    Some(cancel)
                } else {
                    Some(observation)
                }
            }
            (cancel, observation) => cancel.or(observation),
        }
    }
}

/// Per-market registry partitioning tracking events by order id.
///
/// Feeds incrementally from the order snapshot history input; `ingest`
/// consumes only the events appended since the previous call.
#[derive(Debug, Clone, Default)]
pub struct TrackingRegistry {
    states: BTreeMap<OrderId, BasicOrderTrackingState>,
    consumed: usize,
}

impl TrackingRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes events appended to the log since the last call and returns
    /// the ids they touched.
    ///
    /// Events without an attributable order id are skipped.
    pub fn ingest(&mut self, log: &IncrementalSeries<OrderTrackingEvent>) -> Vec<OrderId> {
        let mut touched = Vec::new();
        for event in log.tail(self.consumed) {
            if let Some(order_id) = event.order_id().cloned() {
                self.states
                    .entry(order_id.clone())
                    .or_default()
                    .push_event(event);
                if !touched.contains(&order_id) {
                    touched.push(order_id);
                }
            }
        }
        self.consumed = log.len();
        touched
    }

    /// Tracking state for one order id.
    #[must_use]
    pub fn state(&self, order_id: &OrderId) -> Option<&BasicOrderTrackingState> {
        self.states.get(order_id)
    }

    /// Iterates over all tracked order ids and their states.
    pub fn states(&self) -> impl Iterator<Item = (&OrderId, &BasicOrderTrackingState)> {
        self.states.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sirocco_core::types::{Amount, Market, Price, TradeId};

    fn market() -> Market {
        "binance:BTC-USD".parse().unwrap()
    }

    fn order_id() -> OrderId {
        OrderId::new("o-1").unwrap()
    }

    fn order(full: rust_decimal::Decimal, filled: rust_decimal::Decimal) -> Order {
        Order::new(
            order_id(),
            market(),
            Quantity::new_unchecked(full),
            Price::new(dec!(20000)).unwrap(),
            Quantity::new_unchecked(filled),
        )
        .unwrap()
    }

    fn trade(id: &str, time: i64, quantity: rust_decimal::Decimal) -> Trade {
        Trade {
            id: TradeId::new(id).unwrap(),
            time: Timestamp::new(time).unwrap(),
            market: market(),
            price: Price::new(dec!(20000)).unwrap(),
            quantity: Quantity::new_unchecked(quantity),
            fees: Amount::ZERO,
            order_id: Some(order_id()),
        }
    }

    fn creation(time: i64, order: Order) -> OrderTrackingEvent {
        OrderTrackingEvent::Creation {
            time: Timestamp::new(time).unwrap(),
            order,
        }
    }

    fn observation(time: i64, order: Option<Order>) -> OrderTrackingEvent {
        OrderTrackingEvent::ObservationChange {
            time: Timestamp::new(time).unwrap(),
            order_id: order_id(),
            order,
        }
    }

    fn cancel(time: i64, absolute_rest: Option<rust_decimal::Decimal>) -> OrderTrackingEvent {
        OrderTrackingEvent::Cancel {
            time: Timestamp::new(time).unwrap(),
            order_id: order_id(),
            absolute_rest: absolute_rest.map(Quantity::new_unchecked),
        }
    }

    #[test]
    fn test_order_with_no_trades_is_settled() {
        // Creation at t=100 of buy 1 @ 20000, observed open at t=101.
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            observation(101, Some(order(dec!(1), dec!(0)))),
        ]);

        assert_eq!(state.error_state(), None);
        let reporting = state.reporting_state().unwrap();
        assert_eq!(reporting.full_quantity.as_decimal(), dec!(1));
        assert!(reporting.filled_quantity.is_zero());
        assert!(state.sync_reasons().is_empty());
    }

    #[test]
    fn test_observed_fill_without_trade_expects_trades() {
        // Observation reports 0.4 filled but no own trade arrived yet.
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            observation(101, Some(order(dec!(1), dec!(0.4)))),
        ]);

        assert_eq!(state.error_state(), None);
        let reasons = state.sync_reasons();
        assert_eq!(
            reasons,
            vec![SyncReason::ExpectingTrades {
                time: Timestamp::new(101).unwrap(),
                quantity: Quantity::new_unchecked(dec!(0.4)),
            }]
        );
    }

    #[test]
    fn test_overfill_is_an_error() {
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            OrderTrackingEvent::NewTrade(trade("t-1", 110, dec!(1.5))),
        ]);

        match state.error_state() {
            Some(OrderTrackingError::Overfill {
                total_fill,
                max_fill,
                last_trade,
            }) => {
                assert_eq!(total_fill.as_decimal(), dec!(1.5));
                assert_eq!(max_fill.as_decimal(), dec!(1));
                assert_eq!(last_trade.id.as_str(), "t-1");
            }
            other => panic!("expected overfill, got {other:?}"),
        }
        assert!(state.sync_reasons().is_empty());
    }

    #[test]
    fn test_reappearing_order_is_an_error() {
        let state = BasicOrderTrackingState::from_events(&[
            observation(100, Some(order(dec!(1), dec!(0)))),
            observation(110, None),
            observation(120, Some(order(dec!(1), dec!(0)))),
        ]);

        match state.error_state() {
            Some(OrderTrackingError::ReappearingOrder { time, .. }) => {
                assert_eq!(time.as_millis(), 120);
            }
            other => panic!("expected reappearing order, got {other:?}"),
        }
    }

    #[test]
    fn test_growing_open_quantity_is_inconsistent() {
        // Second observation reports less filled than the first.
        let state = BasicOrderTrackingState::from_events(&[
            observation(100, Some(order(dec!(1), dec!(0.5)))),
            observation(110, Some(order(dec!(1), dec!(0.2)))),
        ]);
        assert!(matches!(
            state.error_state(),
            Some(OrderTrackingError::InconsistentEvents { .. })
        ));
    }

    #[test]
    fn test_creation_full_quantity_mismatch_is_inconsistent() {
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            observation(101, Some(order(dec!(2), dec!(0)))),
        ]);
        assert!(matches!(
            state.error_state(),
            Some(OrderTrackingError::InconsistentEvents { .. })
        ));
    }

    #[test]
    fn test_cancel_rest_larger_than_full_is_inconsistent() {
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            cancel(110, Some(dec!(1.5))),
        ]);
        assert!(matches!(
            state.error_state(),
            Some(OrderTrackingError::InconsistentEvents { .. })
        ));
    }

    #[test]
    fn test_second_cancel_is_inconsistent() {
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            cancel(110, None),
            cancel(120, None),
        ]);
        assert!(matches!(
            state.error_state(),
            Some(OrderTrackingError::InconsistentEvents { .. })
        ));
    }

    #[test]
    fn test_cancel_with_rest_implies_trades() {
        // Buy 1, canceled with 0.25 rest: 0.75 must eventually trade.
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            observation(101, Some(order(dec!(1), dec!(0)))),
            observation(110, None),
            cancel(110, Some(dec!(0.25))),
        ]);

        assert_eq!(state.error_state(), None);
        let reasons = state.sync_reasons();
        assert!(reasons.contains(&SyncReason::ExpectingTrades {
            time: Timestamp::new(110).unwrap(),
            quantity: Quantity::new_unchecked(dec!(0.75)),
        }));
    }

    #[test]
    fn test_equal_implied_magnitudes_prefer_cancel_time() {
        // Cancel at t=105 implies 0.4 traded; the observation at t=110
        // reports the same 0.4. The earlier implication carries the time.
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            cancel(105, Some(dec!(0.6))),
            observation(110, Some(order(dec!(1), dec!(0.4)))),
        ]);

        let reasons = state.sync_reasons();
        assert!(reasons.contains(&SyncReason::ExpectingTrades {
            time: Timestamp::new(105).unwrap(),
            quantity: Quantity::new_unchecked(dec!(0.4)),
        }));
    }

    #[test]
    fn test_trades_ahead_of_observation_expect_observation_change() {
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            observation(101, Some(order(dec!(1), dec!(0)))),
            OrderTrackingEvent::NewTrade(trade("t-1", 105, dec!(0.4))),
        ]);

        let reasons = state.sync_reasons();
        let expected = order(dec!(1), dec!(0.4));
        assert!(reasons.contains(&SyncReason::ExpectingObservationChange {
            time: Timestamp::new(105).unwrap(),
            expected: Some(expected),
        }));
    }

    #[test]
    fn test_canceled_but_still_observed_expects_disappearance() {
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            observation(101, Some(order(dec!(1), dec!(0)))),
            cancel(110, Some(dec!(1))),
        ]);

        let reasons = state.sync_reasons();
        assert!(reasons.contains(&SyncReason::ExpectingObservationChange {
            time: Timestamp::new(110).unwrap(),
            expected: None,
        }));
    }

    #[test]
    fn test_cancel_without_rest_is_unresolved() {
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            observation(101, Some(order(dec!(1), dec!(0)))),
            observation(110, None),
            cancel(110, None),
        ]);

        let reasons = state.sync_reasons();
        assert_eq!(
            reasons,
            vec![SyncReason::UnknownIfMoreTradesBeforeCancel {
                time: Timestamp::new(110).unwrap(),
            }]
        );
    }

    #[test]
    fn test_vanished_order_without_cancel_is_unexplained() {
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            observation(101, Some(order(dec!(1), dec!(0)))),
            observation(110, None),
        ]);

        let reasons = state.sync_reasons();
        assert!(reasons.contains(&SyncReason::UnknownWhyOrderIsGone {
            time: Timestamp::new(110).unwrap(),
        }));
    }

    #[test]
    fn test_trades_without_any_observation_are_unexplained() {
        let state = BasicOrderTrackingState::from_events(&[OrderTrackingEvent::NewTrade(trade(
            "t-1",
            110,
            dec!(0.4),
        ))]);

        let reasons = state.sync_reasons();
        assert_eq!(
            reasons,
            vec![SyncReason::UnknownWhyOrderIsGone {
                time: Timestamp::new(110).unwrap(),
            }]
        );
    }

    #[test]
    fn test_no_error_bounds_total_trade_quantity() {
        // Invariant: no error implies |total| <= |full|.
        let state = BasicOrderTrackingState::from_events(&[
            creation(100, order(dec!(1), dec!(0))),
            observation(101, Some(order(dec!(1), dec!(0)))),
            OrderTrackingEvent::NewTrade(trade("t-1", 105, dec!(0.6))),
            OrderTrackingEvent::NewTrade(trade("t-2", 106, dec!(0.4))),
        ]);
        assert_eq!(state.error_state(), None);
        let full = state.order_with_full_quantity().unwrap();
        assert!(state.total_trade_quantity().abs() <= full.full_quantity.abs());
    }

    #[test]
    fn test_registry_partitions_by_order_id() {
        let mut log = IncrementalSeries::new();
        log.push(creation(100, order(dec!(1), dec!(0))));
        log.push(observation(101, Some(order(dec!(1), dec!(0)))));

        let mut registry = TrackingRegistry::new();
        let touched = registry.ingest(&log);
        assert_eq!(touched, vec![order_id()]);

        // A second ingest with no new events touches nothing.
        assert!(registry.ingest(&log).is_empty());

        log.push(OrderTrackingEvent::NewTrade(trade("t-1", 105, dec!(0.4))));
        assert_eq!(registry.ingest(&log), vec![order_id()]);

        let state = registry.state(&order_id()).unwrap();
        assert_eq!(state.trades().len(), 1);
    }
}
