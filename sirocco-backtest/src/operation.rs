//! Order operation requests and their outcomes.

use sirocco_core::data::{Order, OrderSide};
use sirocco_core::types::{Market, OrderId, Price, Quantity, Timestamp};

use crate::error::InvalidOrder;

/// Specification of an order to place.
///
/// The side is declared explicitly and must agree with the sign of the
/// quantity; the marketplace rejects a mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    /// Declared side
    pub side: OrderSide,
    /// Signed quantity (positive = buy, negative = sell)
    pub quantity: Quantity,
    /// Limit price
    pub price: Price,
}

impl OrderSpec {
    /// Creates a buy spec from an unsigned quantity.
    #[must_use]
    pub fn buy(quantity: Quantity, price: Price) -> Self {
        Self {
            side: OrderSide::Buy,
            quantity: quantity.abs(),
            price,
        }
    }

    /// Creates a sell spec from an unsigned quantity.
    #[must_use]
    pub fn sell(quantity: Quantity, price: Price) -> Self {
        Self {
            side: OrderSide::Sell,
            quantity: -quantity.abs(),
            price,
        }
    }
}

/// A single order operation requested by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    /// Place a new order
    PlaceOrder {
        /// Target market
        market: Market,
        /// Order to place
        spec: OrderSpec,
    },
    /// Cancel an open order
    CancelOrder {
        /// Target market
        market: Market,
        /// Order to cancel
        order_id: OrderId,
        /// Known unfilled magnitude at cancellation, if any
        absolute_rest: Option<Quantity>,
    },
}

impl OperationRequest {
    /// Market the operation targets.
    #[must_use]
    pub fn market(&self) -> &Market {
        match self {
            Self::PlaceOrder { market, .. } | Self::CancelOrder { market, .. } => market,
        }
    }
}

/// Outcome of a dispatched operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The marketplace accepted the operation
    Accepted {
        /// The placed order, for placements
        order: Option<Order>,
    },
    /// The marketplace rejected the operation
    Rejected(InvalidOrder),
}

impl OperationOutcome {
    /// Returns true if the operation was accepted.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// A completed operation request, as recorded in the session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedOperation {
    /// Tick time the operation was dispatched at
    pub time: Timestamp,
    /// The original request
    pub request: OperationRequest,
    /// What the marketplace did with it
    pub outcome: OperationOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_spec_sides_sign_quantities() {
        let qty = Quantity::new_unchecked(dec!(1.5));
        let price = Price::new(dec!(100)).unwrap();
        assert!(OrderSpec::buy(qty, price).quantity.is_positive());
        assert!(OrderSpec::sell(qty, price).quantity.is_negative());
    }

    #[test]
    fn test_operation_request_market() {
        let market: Market = "binance:BTC-USD".parse().unwrap();
        let request = OperationRequest::CancelOrder {
            market: market.clone(),
            order_id: OrderId::new("o-1").unwrap(),
            absolute_rest: None,
        };
        assert_eq!(request.market(), &market);
    }
}
