//! Timestamp type for representing Unix millisecond timestamps.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{CandleLength, ValidationError};

/// Timestamp type - used for representing Unix millisecond timestamps.
///
/// Wraps an `i64` value representing milliseconds since Unix epoch.
/// Simulated time never reads the wall clock; timestamps are constructed
/// from data or configuration.
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Timestamp;
///
/// let ts = Timestamp::new(1_704_067_200_000).unwrap();
/// assert_eq!(ts.as_secs(), 1_704_067_200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Zero timestamp constant.
    pub const ZERO: Self = Self(0);

    /// Creates a new `Timestamp` from milliseconds since Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTimestamp` if the value is negative.
    pub fn new(millis: i64) -> Result<Self, ValidationError> {
        if millis < 0 {
            return Err(ValidationError::InvalidTimestamp(millis));
        }
        Ok(Self(millis))
    }

    /// Creates a new `Timestamp` without validation.
    ///
    /// The caller must ensure the value is non-negative.
    #[must_use]
    pub const fn new_unchecked(millis: i64) -> Self {
        Self(millis)
    }

    /// Creates a `Timestamp` from seconds since Unix epoch.
    pub fn from_secs(secs: i64) -> Result<Self, ValidationError> {
        Self::new(secs * 1000)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1000
    }

    /// Returns true if the timestamp is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Rounds the timestamp down to the nearest multiple of `resolution`.
    #[must_use]
    pub fn floor_to(&self, resolution: CandleLength) -> Self {
        Self(self.0 - self.0.rem_euclid(resolution.as_millis()))
    }

    /// Returns true if the timestamp is an exact multiple of `resolution`.
    #[must_use]
    pub fn is_aligned_to(&self, resolution: CandleLength) -> bool {
        self.0.rem_euclid(resolution.as_millis()) == 0
    }

    /// Returns the timestamp shifted forward by `length`.
    #[must_use]
    pub fn plus(&self, length: CandleLength) -> Self {
        Self(self.0 + length.as_millis())
    }

    /// Returns the timestamp shifted by a signed millisecond offset,
    /// clamped at the epoch.
    #[must_use]
    pub fn offset_millis(&self, millis: i64) -> Self {
        Self((self.0 + millis).max(0))
    }

    /// Converts to a `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
    }

    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis().max(0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Timestamp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let millis: i64 = s
            .parse()
            .map_err(|_| ValidationError::InvalidTimestamp(0))?;
        Self::new(millis)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_new_negative() {
        assert!(matches!(
            Timestamp::new(-1),
            Err(ValidationError::InvalidTimestamp(-1))
        ));
    }

    #[test]
    fn test_timestamp_floor_to() {
        let res = CandleLength::from_secs(60).unwrap();
        let ts = Timestamp::new(90_500).unwrap();
        assert_eq!(ts.floor_to(res).as_millis(), 60_000);
        assert!(Timestamp::new(120_000).unwrap().is_aligned_to(res));
        assert!(!ts.is_aligned_to(res));
    }

    #[test]
    fn test_timestamp_plus() {
        let len = CandleLength::from_secs(300).unwrap();
        let ts = Timestamp::new(1_000_000).unwrap();
        assert_eq!(ts.plus(len).as_millis(), 1_300_000);
    }

    #[test]
    fn test_timestamp_to_datetime() {
        let ts = Timestamp::new(1_704_067_200_000).unwrap();
        assert_eq!(ts.to_datetime().timestamp_millis(), 1_704_067_200_000);
    }

    #[test]
    fn test_timestamp_serde_roundtrip() {
        let ts = Timestamp::new(1_704_067_200_000).unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }
}
