//! Candle (OHLC bar) data structure.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, CandleLength, Price, Timestamp};

use super::DataValidationError;

/// OHLC candle over a fixed duration for one market.
///
/// `quote_volume` is the traded volume denominated in the quote currency.
/// The market itself is not stored on the candle; a candle only makes sense
/// inside a per-market history segment.
///
/// # Examples
///
/// ```
/// use sirocco_core::data::Candle;
/// use sirocco_core::types::{Amount, CandleLength, Price, Timestamp};
/// use rust_decimal_macros::dec;
///
/// let candle = Candle::builder()
///     .start_time(Timestamp::new(1_704_067_200_000).unwrap())
///     .length(CandleLength::MINUTE_1)
///     .open(Price::new(dec!(42000)).unwrap())
///     .high(Price::new(dec!(42500)).unwrap())
///     .low(Price::new(dec!(41800)).unwrap())
///     .close(Price::new(dec!(42300)).unwrap())
///     .quote_volume(Amount::new(dec!(100000)).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(candle.close_time().as_millis(), 1_704_067_260_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Start of the candle interval
    pub start_time: Timestamp,
    /// Opening price
    pub open: Price,
    /// Highest price
    pub high: Price,
    /// Lowest price
    pub low: Price,
    /// Closing price
    pub close: Price,
    /// Traded volume in quote currency
    pub quote_volume: Amount,
    /// Duration of the candle interval
    pub length: CandleLength,
}

impl Candle {
    /// Creates a new builder for `Candle`.
    #[must_use]
    pub fn builder() -> CandleBuilder {
        CandleBuilder::default()
    }

    /// Returns the end of the candle interval.
    #[must_use]
    pub fn close_time(&self) -> Timestamp {
        self.start_time.plus(self.length)
    }

    /// Validates OHLC coherence.
    ///
    /// # Errors
    ///
    /// Returns an error if high < low or open/close fall outside the
    /// high-low range.
    pub fn validate(&self) -> Result<(), DataValidationError> {
        if self.high < self.low {
            return Err(DataValidationError::InvalidPriceRelation(format!(
                "high ({}) < low ({})",
                self.high, self.low
            )));
        }
        if self.open > self.high || self.open < self.low {
            return Err(DataValidationError::InvalidPriceRelation(format!(
                "open ({}) outside high-low range ({}-{})",
                self.open, self.low, self.high
            )));
        }
        if self.close > self.high || self.close < self.low {
            return Err(DataValidationError::InvalidPriceRelation(format!(
                "close ({}) outside high-low range ({}-{})",
                self.close, self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Builder for `Candle`.
#[derive(Debug, Default)]
pub struct CandleBuilder {
    start_time: Option<Timestamp>,
    length: Option<CandleLength>,
    open: Option<Price>,
    high: Option<Price>,
    low: Option<Price>,
    close: Option<Price>,
    quote_volume: Option<Amount>,
}

impl CandleBuilder {
    /// Sets the start time.
    #[must_use]
    pub fn start_time(mut self, start_time: Timestamp) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Sets the candle length.
    #[must_use]
    pub fn length(mut self, length: CandleLength) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets the open price.
    #[must_use]
    pub fn open(mut self, open: Price) -> Self {
        self.open = Some(open);
        self
    }

    /// Sets the high price.
    #[must_use]
    pub fn high(mut self, high: Price) -> Self {
        self.high = Some(high);
        self
    }

    /// Sets the low price.
    #[must_use]
    pub fn low(mut self, low: Price) -> Self {
        self.low = Some(low);
        self
    }

    /// Sets the close price.
    #[must_use]
    pub fn close(mut self, close: Price) -> Self {
        self.close = Some(close);
        self
    }

    /// Sets the quote volume.
    #[must_use]
    pub fn quote_volume(mut self, quote_volume: Amount) -> Self {
        self.quote_volume = Some(quote_volume);
        self
    }

    /// Builds the `Candle`.
    ///
    /// # Errors
    ///
    /// Returns an error if any required field is missing or validation
    /// fails.
    pub fn build(self) -> Result<Candle, DataValidationError> {
        let candle = Candle {
            start_time: self
                .start_time
                .ok_or(DataValidationError::MissingField("start_time"))?,
            length: self
                .length
                .ok_or(DataValidationError::MissingField("length"))?,
            open: self.open.ok_or(DataValidationError::MissingField("open"))?,
            high: self.high.ok_or(DataValidationError::MissingField("high"))?,
            low: self.low.ok_or(DataValidationError::MissingField("low"))?,
            close: self
                .close
                .ok_or(DataValidationError::MissingField("close"))?,
            quote_volume: self
                .quote_volume
                .ok_or(DataValidationError::MissingField("quote_volume"))?,
        };
        candle.validate()?;
        Ok(candle)
    }
}
