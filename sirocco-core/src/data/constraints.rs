//! Order sizing constraints and precision quantization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A precision rule for prices or quantities.
///
/// Quantization always rounds toward zero; a simulated marketplace never
/// rounds an order up into a size the exchange would reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// At most this many digits after the decimal separator.
    DecimalPlaces(u32),
    /// At most this many significant digits.
    SignificantDigits(u32),
    /// Values must be an integer multiple of this step.
    MultipleOf(Decimal),
}

impl Precision {
    /// Quantizes `value` to this precision, rounding toward zero.
    #[must_use]
    pub fn quantize(&self, value: Decimal) -> Decimal {
        match self {
            Self::DecimalPlaces(places) => value.trunc_with_scale(*places),
            Self::SignificantDigits(digits) => quantize_significant(value, *digits),
            Self::MultipleOf(step) => {
                if step.is_zero() {
                    value
                } else {
                    (value / step).trunc() * *step
                }
            }
        }
    }
}

/// Truncates `value` to `digits` significant digits.
fn quantize_significant(value: Decimal, digits: u32) -> Decimal {
    if value.is_zero() || digits == 0 {
        return Decimal::ZERO;
    }
    // Decimal exponent of the leading digit: 10^magnitude <= |value| < 10^(magnitude+1).
    let mut magnitude: i32 = 0;
    let mut probe = value.abs();
    let ten = Decimal::TEN;
    while probe >= ten {
        probe /= ten;
        magnitude += 1;
    }
    while probe < Decimal::ONE {
        probe *= ten;
        magnitude -= 1;
    }

    let digits = i32::try_from(digits).unwrap_or(i32::MAX);
    let scale = digits - 1 - magnitude;
    if scale >= 0 {
        value.trunc_with_scale(u32::try_from(scale).unwrap_or(u32::MAX))
    } else {
        let mut factor = Decimal::ONE;
        for _ in 0..-scale {
            factor *= ten;
        }
        (value / factor).trunc() * factor
    }
}

/// Price and quantity precision for one market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConstraints {
    /// Precision applied to order prices
    pub price_precision: Precision,
    /// Precision applied to order quantities
    pub quantity_precision: Precision,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_places_truncates_toward_zero() {
        let precision = Precision::DecimalPlaces(2);
        assert_eq!(precision.quantize(dec!(1.239)), dec!(1.23));
        assert_eq!(precision.quantize(dec!(-1.239)), dec!(-1.23));
    }

    #[test]
    fn test_significant_digits() {
        let precision = Precision::SignificantDigits(3);
        assert_eq!(precision.quantize(dec!(12345)), dec!(12300));
        assert_eq!(precision.quantize(dec!(0.0012349)), dec!(0.00123));
        assert_eq!(precision.quantize(dec!(-12345)), dec!(-12300));
        assert_eq!(precision.quantize(dec!(0)), dec!(0));
    }

    #[test]
    fn test_multiple_of() {
        let precision = Precision::MultipleOf(dec!(0.25));
        assert_eq!(precision.quantize(dec!(1.73)), dec!(1.50));
        assert_eq!(precision.quantize(dec!(-1.73)), dec!(-1.50));
    }
}
