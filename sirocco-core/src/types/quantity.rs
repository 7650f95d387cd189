//! Quantity type for representing signed trading quantities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use super::ValidationError;

/// Quantity type - used for representing trading quantities.
///
/// Wraps a `Decimal` value to ensure type safety. Quantities are signed:
/// positive values represent buys, negative values represent sells.
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Quantity;
/// use rust_decimal_macros::dec;
///
/// let buy = Quantity::new(dec!(1.5)).unwrap();
/// let sell = Quantity::new(dec!(-1.5)).unwrap();
/// assert!(buy.is_positive());
/// assert_eq!(buy, sell.abs());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Zero quantity constant.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new `Quantity` from a `Decimal` value.
    ///
    /// Quantities can be negative (sells).
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        Ok(Self(value))
    }

    /// Creates a new non-negative `Quantity`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NegativeQuantity` if the value is negative.
    pub fn new_unsigned(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity(value));
        }
        Ok(Self(value))
    }

    /// Creates a new `Quantity` without validation.
    #[must_use]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying `Decimal` value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns true if the quantity is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns the absolute value of the quantity.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Returns true if the quantity is positive (a buy).
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the quantity is negative (a sell).
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns `|self|` re-signed to match the sign of `other`.
    ///
    /// A zero `other` leaves the magnitude unsigned (positive).
    #[must_use]
    pub fn with_sign_of(&self, other: Self) -> Self {
        if other.is_negative() {
            Self(-self.0.abs())
        } else {
            Self(self.0.abs())
        }
    }

    /// Returns true if both quantities are on the same side (or either is zero).
    #[must_use]
    pub fn sign_matches(&self, other: Self) -> bool {
        self.is_zero() || other.is_zero() || self.is_positive() == other.is_positive()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s).map_err(|_| ValidationError::NegativeQuantity(Decimal::ZERO))?;
        Self::new(decimal)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Quantity {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|q| q.0).sum())
    }
}

impl From<Quantity> for Decimal {
    fn from(qty: Quantity) -> Self {
        qty.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantity_signed() {
        let sell = Quantity::new(dec!(-2.5)).unwrap();
        assert!(sell.is_negative());
        assert_eq!(sell.abs().as_decimal(), dec!(2.5));
    }

    #[test]
    fn test_quantity_new_unsigned_rejects_negative() {
        assert!(matches!(
            Quantity::new_unsigned(dec!(-1)),
            Err(ValidationError::NegativeQuantity(_))
        ));
    }

    #[test]
    fn test_quantity_with_sign_of() {
        let qty = Quantity::new_unchecked(dec!(0.4));
        let sell = Quantity::new_unchecked(dec!(-1));
        assert_eq!(qty.with_sign_of(sell).as_decimal(), dec!(-0.4));
        assert_eq!(qty.with_sign_of(qty).as_decimal(), dec!(0.4));
    }

    #[test]
    fn test_quantity_sign_matches() {
        let buy = Quantity::new_unchecked(dec!(1));
        let sell = Quantity::new_unchecked(dec!(-1));
        assert!(!buy.sign_matches(sell));
        assert!(buy.sign_matches(Quantity::ZERO));
    }

    #[test]
    fn test_quantity_sum() {
        let total: Quantity = [dec!(1), dec!(-0.25), dec!(0.5)]
            .into_iter()
            .map(Quantity::new_unchecked)
            .sum();
        assert_eq!(total.as_decimal(), dec!(1.25));
    }
}
