//! Trade data structure.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, Market, OrderId, Price, Quantity, Timestamp, TradeId};

/// A single own trade.
///
/// Sign convention: positive `quantity` is a buy, negative a sell.
/// `fees` are denominated in the quote currency. `order_id` is present when
/// the exchange (or simulator) attributes the trade to one of our orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade identifier
    pub id: TradeId,
    /// Execution time
    pub time: Timestamp,
    /// Market the trade happened on
    pub market: Market,
    /// Execution price
    pub price: Price,
    /// Signed quantity (positive = buy, negative = sell)
    pub quantity: Quantity,
    /// Fees in quote currency
    pub fees: Amount,
    /// Originating order, if attributed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

impl Trade {
    /// Returns true if this trade is a buy.
    #[must_use]
    pub fn is_buy(&self) -> bool {
        self.quantity.is_positive()
    }

    /// Returns true if this trade is a sell.
    #[must_use]
    pub fn is_sell(&self) -> bool {
        self.quantity.is_negative()
    }

    /// Returns the unsigned quote-currency value of the trade, fees
    /// excluded.
    #[must_use]
    pub fn quote_value(&self) -> Amount {
        self.price.cost_of(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(quantity: rust_decimal::Decimal) -> Trade {
        Trade {
            id: TradeId::new("t-1").unwrap(),
            time: Timestamp::new(1_000).unwrap(),
            market: "binance:BTC-USD".parse().unwrap(),
            price: Price::new(dec!(20000)).unwrap(),
            quantity: Quantity::new_unchecked(quantity),
            fees: Amount::new(dec!(2)).unwrap(),
            order_id: None,
        }
    }

    #[test]
    fn test_trade_sides() {
        assert!(trade(dec!(0.5)).is_buy());
        assert!(trade(dec!(-0.5)).is_sell());
    }

    #[test]
    fn test_trade_quote_value_unsigned() {
        assert_eq!(trade(dec!(-0.5)).quote_value().as_decimal(), dec!(10000));
    }
}
