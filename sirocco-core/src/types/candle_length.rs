//! Candle length / time resolution type.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Fixed duration of a candle, or the resolution of a time input.
///
/// Wraps a positive number of milliseconds. Unlike a closed period
/// enumeration, any positive duration is representable; common lengths are
/// provided as constants.
///
/// # Examples
///
/// ```
/// use sirocco_core::types::CandleLength;
///
/// let len = CandleLength::from_secs(60).unwrap();
/// assert_eq!(len, CandleLength::MINUTE_1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CandleLength(i64);

impl CandleLength {
    /// One second.
    pub const SECOND_1: Self = Self(1_000);
    /// One minute.
    pub const MINUTE_1: Self = Self(60_000);
    /// Five minutes.
    pub const MINUTE_5: Self = Self(5 * 60_000);
    /// Fifteen minutes.
    pub const MINUTE_15: Self = Self(15 * 60_000);
    /// One hour.
    pub const HOUR_1: Self = Self(60 * 60_000);
    /// One day.
    pub const DAY_1: Self = Self(24 * 60 * 60_000);

    /// Creates a `CandleLength` from milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidCandleLength` if the value is not
    /// positive.
    pub fn from_millis(millis: i64) -> Result<Self, ValidationError> {
        if millis <= 0 {
            return Err(ValidationError::InvalidCandleLength(millis));
        }
        Ok(Self(millis))
    }

    /// Creates a `CandleLength` from seconds.
    pub fn from_secs(secs: i64) -> Result<Self, ValidationError> {
        Self::from_millis(secs.saturating_mul(1000))
    }

    /// Returns the length in milliseconds.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns the length in whole seconds.
    #[must_use]
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1000
    }

    /// Returns this length multiplied by a positive factor.
    #[must_use]
    pub fn scaled(&self, factor: u32) -> Self {
        Self(self.0 * i64::from(factor.max(1)))
    }
}

impl fmt::Display for CandleLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1000 == 0 {
            write!(f, "{}s", self.0 / 1000)
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}
