//! Order data structure.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Market, OrderId, Price, Quantity};

/// Order side - Buy or Sell direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order (positive quantities)
    Buy,
    /// Sell order (negative quantities)
    Sell,
}

impl OrderSide {
    /// Returns true if this is a buy order.
    #[must_use]
    pub const fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }

    /// Returns true if this is a sell order.
    #[must_use]
    pub const fn is_sell(&self) -> bool {
        matches!(self, Self::Sell)
    }

    /// Returns the side implied by the sign of a quantity, if any.
    #[must_use]
    pub fn of(quantity: Quantity) -> Option<Self> {
        if quantity.is_positive() {
            Some(Self::Buy)
        } else if quantity.is_negative() {
            Some(Self::Sell)
        } else {
            None
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// An order as placed on, or observed from, a marketplace.
///
/// `full_quantity` and `filled_quantity` are signed and always share a
/// sign; the open quantity is their difference. Sign convention follows
/// trades: positive = buy, negative = sell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Market the order was placed on
    pub market: Market,
    /// Total signed quantity of the order
    pub full_quantity: Quantity,
    /// Limit price
    pub price: Price,
    /// Signed quantity already filled
    pub filled_quantity: Quantity,
}

impl Order {
    /// Creates a new `Order`.
    ///
    /// # Errors
    ///
    /// Returns an error if `full_quantity` is zero, the two quantities'
    /// signs disagree, or the filled quantity exceeds the full quantity in
    /// magnitude.
    pub fn new(
        id: OrderId,
        market: Market,
        full_quantity: Quantity,
        price: Price,
        filled_quantity: Quantity,
    ) -> Result<Self, OrderError> {
        if full_quantity.is_zero() {
            return Err(OrderError::ZeroQuantity);
        }
        if !full_quantity.sign_matches(filled_quantity) {
            return Err(OrderError::SignMismatch {
                full: full_quantity,
                filled: filled_quantity,
            });
        }
        if filled_quantity.abs() > full_quantity.abs() {
            return Err(OrderError::FillExceedsQuantity {
                fill: filled_quantity,
                full: full_quantity,
            });
        }
        Ok(Self {
            id,
            market,
            full_quantity,
            price,
            filled_quantity,
        })
    }

    /// Creates an unfilled `Order`.
    pub fn open(
        id: OrderId,
        market: Market,
        full_quantity: Quantity,
        price: Price,
    ) -> Result<Self, OrderError> {
        Self::new(id, market, full_quantity, price, Quantity::ZERO)
    }

    /// Returns the side of the order.
    #[must_use]
    pub fn side(&self) -> OrderSide {
        if self.full_quantity.is_negative() {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        }
    }

    /// Returns the signed quantity still open.
    #[must_use]
    pub fn open_quantity(&self) -> Quantity {
        self.full_quantity - self.filled_quantity
    }

    /// Returns true if nothing remains open.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.open_quantity().is_zero()
    }

    /// Returns the order with its filled quantity reset to zero.
    #[must_use]
    pub fn reset_quantity(&self) -> Self {
        Self {
            filled_quantity: Quantity::ZERO,
            ..self.clone()
        }
    }

    /// Returns the order with `|delta|` added to the filled quantity, signed
    /// to match the full quantity.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::FillExceedsQuantity` if the resulting fill would
    /// exceed the full quantity in magnitude.
    pub fn reduce_quantity(&self, delta: Quantity) -> Result<Self, OrderError> {
        let filled = self.filled_quantity + delta.with_sign_of(self.full_quantity);
        if filled.abs() > self.full_quantity.abs() {
            return Err(OrderError::FillExceedsQuantity {
                fill: filled,
                full: self.full_quantity,
            });
        }
        Ok(Self {
            filled_quantity: filled,
            ..self.clone()
        })
    }
}

/// Order construction and fill errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    /// Full quantity is zero
    #[error("order quantity cannot be zero")]
    ZeroQuantity,

    /// Full and filled quantity are on opposite sides
    #[error("filled quantity {filled} disagrees in sign with full quantity {full}")]
    SignMismatch {
        /// Full quantity
        full: Quantity,
        /// Filled quantity
        filled: Quantity,
    },

    /// Fill exceeds the order's full quantity
    #[error("fill quantity {fill} exceeds full quantity {full}")]
    FillExceedsQuantity {
        /// Resulting fill
        fill: Quantity,
        /// Full quantity
        full: Quantity,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market() -> Market {
        "binance:BTC-USD".parse().unwrap()
    }

    fn buy_order(full: rust_decimal::Decimal, filled: rust_decimal::Decimal) -> Order {
        Order::new(
            OrderId::new("o-1").unwrap(),
            market(),
            Quantity::new_unchecked(full),
            Price::new(dec!(20000)).unwrap(),
            Quantity::new_unchecked(filled),
        )
        .unwrap()
    }

    #[test]
    fn test_order_rejects_zero_quantity() {
        let result = Order::open(
            OrderId::new("o-1").unwrap(),
            market(),
            Quantity::ZERO,
            Price::new(dec!(1)).unwrap(),
        );
        assert!(matches!(result, Err(OrderError::ZeroQuantity)));
    }

    #[test]
    fn test_order_rejects_sign_mismatch() {
        let result = Order::new(
            OrderId::new("o-1").unwrap(),
            market(),
            Quantity::new_unchecked(dec!(1)),
            Price::new(dec!(1)).unwrap(),
            Quantity::new_unchecked(dec!(-0.5)),
        );
        assert!(matches!(result, Err(OrderError::SignMismatch { .. })));
    }

    #[test]
    fn test_order_open_quantity() {
        let order = buy_order(dec!(1), dec!(0.4));
        assert_eq!(order.open_quantity().as_decimal(), dec!(0.6));
        assert_eq!(order.side(), OrderSide::Buy);
        assert!(!order.is_filled());
    }

    #[test]
    fn test_order_reset_and_reduce() {
        let order = buy_order(dec!(1), dec!(0.4));
        let reset = order.reset_quantity();
        assert!(reset.filled_quantity.is_zero());

        let reduced = reset
            .reduce_quantity(Quantity::new_unchecked(dec!(0.7)))
            .unwrap();
        assert_eq!(reduced.filled_quantity.as_decimal(), dec!(0.7));
    }

    #[test]
    fn test_order_reduce_signs_delta_for_sells() {
        let sell = Order::open(
            OrderId::new("o-2").unwrap(),
            market(),
            Quantity::new_unchecked(dec!(-2)),
            Price::new(dec!(20000)).unwrap(),
        )
        .unwrap();
        let reduced = sell.reduce_quantity(Quantity::new_unchecked(dec!(0.5))).unwrap();
        assert_eq!(reduced.filled_quantity.as_decimal(), dec!(-0.5));
        assert_eq!(reduced.open_quantity().as_decimal(), dec!(-1.5));
    }

    #[test]
    fn test_order_reduce_overfill() {
        let order = buy_order(dec!(1), dec!(0.9));
        let result = order.reduce_quantity(Quantity::new_unchecked(dec!(0.2)));
        assert!(matches!(result, Err(OrderError::FillExceedsQuantity { .. })));
    }
}
