//! Price type for representing asset prices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Amount, Quantity, ValidationError};

/// Price type - used for representing asset prices.
///
/// Wraps a `Decimal` value to ensure type safety and prevent
/// mixing price values with other numeric types.
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Price;
/// use rust_decimal_macros::dec;
///
/// let price = Price::new(dec!(20000)).unwrap();
/// assert_eq!(price.as_decimal(), dec!(20000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero price constant.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new `Price` from a `Decimal` value.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NegativePrice` if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO {
            return Err(ValidationError::NegativePrice(value));
        }
        Ok(Self(value))
    }

    /// Creates a new `Price` without validation.
    ///
    /// The caller must ensure the value is non-negative.
    #[must_use]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying `Decimal` value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns true if the price is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns the quote-currency cost of trading `quantity` at this price.
    ///
    /// The result is unsigned; the direction of the trade is carried by the
    /// quantity's sign, not by the cost.
    #[must_use]
    pub fn cost_of(&self, quantity: Quantity) -> Amount {
        Amount::new_unchecked((self.0 * quantity.as_decimal()).abs())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s).map_err(|_| ValidationError::NegativePrice(Decimal::ZERO))?;
        Self::new(decimal)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}
