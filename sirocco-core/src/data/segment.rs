//! Candle and trade history segments.

use serde::{Deserialize, Serialize};

use crate::types::{CandleLength, Timestamp};

use super::{Candle, DataValidationError, IncrementalSeries, Trade};

/// Contiguous, aligned candle history for one market.
///
/// All candles share the segment's length; candle `n` starts exactly at
/// `start + n × length`. The segment is append-only; snapshots taken with
/// [`prefix`](Self::prefix) share storage with the full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleHistorySegment {
    /// Segment alignment instant
    pub start: Timestamp,
    /// Length of every candle in the segment
    pub length: CandleLength,
    candles: IncrementalSeries<Candle>,
}

impl CandleHistorySegment {
    /// Creates an empty segment.
    #[must_use]
    pub fn new(start: Timestamp, length: CandleLength) -> Self {
        Self {
            start,
            length,
            candles: IncrementalSeries::new(),
        }
    }

    /// Creates a segment from candles, validating contiguity and alignment.
    pub fn from_candles(
        start: Timestamp,
        length: CandleLength,
        candles: Vec<Candle>,
    ) -> Result<Self, DataValidationError> {
        let mut segment = Self::new(start, length);
        for candle in candles {
            segment.push(candle)?;
        }
        Ok(segment)
    }

    /// Appends a candle.
    ///
    /// # Errors
    ///
    /// Returns an error if the candle's length differs from the segment's,
    /// or its start time is not exactly one length after the previous
    /// candle (or the segment start, for the first candle).
    pub fn push(&mut self, candle: Candle) -> Result<(), DataValidationError> {
        if candle.length != self.length {
            return Err(DataValidationError::LengthMismatch {
                candle: candle.length,
                segment: self.length,
            });
        }
        let expected = self
            .candles
            .last()
            .map_or(self.start, Candle::close_time);
        if candle.start_time != expected {
            return Err(DataValidationError::NonContiguousCandle {
                expected,
                actual: candle.start_time,
            });
        }
        self.candles.push(candle);
        Ok(())
    }

    /// Returns the number of candles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Returns true if the segment has no candles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Returns the candle at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Returns the most recent candle.
    #[must_use]
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Returns the candles as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Candle] {
        self.candles.as_slice()
    }

    /// Iterates over the candles starting at `from` (fold resume point).
    pub fn tail(&self, from: usize) -> std::slice::Iter<'_, Candle> {
        self.candles.tail(from)
    }

    /// Returns a snapshot of the first `len` candles, sharing storage.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            start: self.start,
            length: self.length,
            candles: self.candles.prefix(len),
        }
    }

    /// Returns the close time of the last candle, or the segment start.
    #[must_use]
    pub fn end(&self) -> Timestamp {
        self.candles.last().map_or(self.start, Candle::close_time)
    }
}

/// Append-only own-trade history for one market.
///
/// Trades are ordered by `(time, insertion order)`; every trade's time is
/// at or after the segment start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeHistorySegment {
    /// Earliest admissible trade time
    pub start: Timestamp,
    trades: IncrementalSeries<Trade>,
}

impl TradeHistorySegment {
    /// Creates an empty segment.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            start,
            trades: IncrementalSeries::new(),
        }
    }

    /// Creates a segment from trades, validating ordering.
    pub fn from_trades(
        start: Timestamp,
        trades: Vec<Trade>,
    ) -> Result<Self, DataValidationError> {
        let mut segment = Self::new(start);
        for trade in trades {
            segment.push(trade)?;
        }
        Ok(segment)
    }

    /// Appends a trade.
    ///
    /// # Errors
    ///
    /// Returns an error if the trade is earlier than the segment start or
    /// the preceding trade.
    pub fn push(&mut self, trade: Trade) -> Result<(), DataValidationError> {
        let minimum = self.trades.last().map_or(self.start, |last| last.time);
        if trade.time < minimum {
            return Err(DataValidationError::UnorderedTrade {
                time: trade.time,
                minimum,
            });
        }
        self.trades.push(trade);
        Ok(())
    }

    /// Returns the number of trades.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    /// Returns true if the segment has no trades.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Returns the trade at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Trade> {
        self.trades.get(index)
    }

    /// Returns the most recent trade.
    #[must_use]
    pub fn last(&self) -> Option<&Trade> {
        self.trades.last()
    }

    /// Returns the trades as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Trade] {
        self.trades.as_slice()
    }

    /// Iterates over the trades starting at `from` (fold resume point).
    pub fn tail(&self, from: usize) -> std::slice::Iter<'_, Trade> {
        self.trades.tail(from)
    }

    /// Returns a snapshot of the first `len` trades, sharing storage.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            start: self.start,
            trades: self.trades.prefix(len),
        }
    }

    /// Merges a freshly loaded live segment into this stored one.
    ///
    /// Stored trades strictly before the live segment's start are kept as
    /// is; everything at or after it is superseded by the live trades. The
    /// result is truncated at `inspection_time`: live trades at or after it
    /// are dropped, since a later reload will cover them.
    ///
    /// # Errors
    ///
    /// Returns `DataValidationError::DisjointSegments` if the live segment
    /// starts before the stored one, and ordering errors if the spliced
    /// sequences disagree.
    pub fn merged_with_live(
        &self,
        live: &TradeHistorySegment,
        inspection_time: Timestamp,
    ) -> Result<Self, DataValidationError> {
        if live.start < self.start {
            return Err(DataValidationError::DisjointSegments {
                stored_start: self.start,
                live_start: live.start,
            });
        }
        let mut merged = Self::new(self.start);
        for trade in self.trades.iter().filter(|t| t.time < live.start) {
            merged.push(trade.clone())?;
        }
        for trade in live.trades.iter().filter(|t| t.time < inspection_time) {
            merged.push(trade.clone())?;
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Amount, Market, Price, Quantity, TradeId};
    use rust_decimal_macros::dec;

    fn candle(start_ms: i64) -> Candle {
        Candle::builder()
            .start_time(Timestamp::new(start_ms).unwrap())
            .length(CandleLength::MINUTE_1)
            .open(Price::new(dec!(100)).unwrap())
            .high(Price::new(dec!(101)).unwrap())
            .low(Price::new(dec!(99)).unwrap())
            .close(Price::new(dec!(100)).unwrap())
            .quote_volume(Amount::new(dec!(1000)).unwrap())
            .build()
            .unwrap()
    }

    fn trade(id: &str, time_ms: i64) -> Trade {
        Trade {
            id: TradeId::new(id).unwrap(),
            time: Timestamp::new(time_ms).unwrap(),
            market: market(),
            price: Price::new(dec!(100)).unwrap(),
            quantity: Quantity::new_unchecked(dec!(1)),
            fees: Amount::ZERO,
            order_id: None,
        }
    }

    fn market() -> Market {
        "binance:BTC-USD".parse().unwrap()
    }

    #[test]
    fn test_candle_segment_contiguity() {
        let mut segment =
            CandleHistorySegment::new(Timestamp::new(0).unwrap(), CandleLength::MINUTE_1);
        segment.push(candle(0)).unwrap();
        segment.push(candle(60_000)).unwrap();

        let result = segment.push(candle(180_000));
        assert!(matches!(
            result,
            Err(DataValidationError::NonContiguousCandle { .. })
        ));
        assert_eq!(segment.end().as_millis(), 120_000);
    }

    #[test]
    fn test_candle_segment_rejects_length_mismatch() {
        let mut segment =
            CandleHistorySegment::new(Timestamp::new(0).unwrap(), CandleLength::MINUTE_5);
        assert!(matches!(
            segment.push(candle(0)),
            Err(DataValidationError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_candle_segment_prefix_shares() {
        let segment = CandleHistorySegment::from_candles(
            Timestamp::new(0).unwrap(),
            CandleLength::MINUTE_1,
            vec![candle(0), candle(60_000), candle(120_000)],
        )
        .unwrap();
        let prefix = segment.prefix(2);
        assert_eq!(prefix.len(), 2);
        assert_eq!(prefix.end().as_millis(), 120_000);
    }

    #[test]
    fn test_trade_segment_ordering() {
        let mut segment = TradeHistorySegment::new(Timestamp::new(100).unwrap());
        segment.push(trade("a", 110)).unwrap();
        segment.push(trade("b", 110)).unwrap();
        let result = segment.push(trade("c", 90));
        assert!(matches!(
            result,
            Err(DataValidationError::UnorderedTrade { .. })
        ));
    }

    #[test]
    fn test_trade_segment_merge_truncates_at_inspection_time() {
        // Stored [A@110, B@112, C@114]; live from 111 [B@112, C2@113, D@119, E@120];
        // inspection at 120 -> [A@110, B@112, C2@113, D@119].
        let stored = TradeHistorySegment::from_trades(
            Timestamp::new(100).unwrap(),
            vec![trade("A", 110), trade("B", 112), trade("C", 114)],
        )
        .unwrap();
        let live = TradeHistorySegment::from_trades(
            Timestamp::new(111).unwrap(),
            vec![
                trade("B", 112),
                trade("C2", 113),
                trade("D", 119),
                trade("E", 120),
            ],
        )
        .unwrap();

        let merged = stored
            .merged_with_live(&live, Timestamp::new(120).unwrap())
            .unwrap();
        let ids: Vec<_> = merged.as_slice().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C2", "D"]);
        assert_eq!(merged.start.as_millis(), 100);
    }

    #[test]
    fn test_trade_segment_merge_rejects_disjoint() {
        let stored = TradeHistorySegment::new(Timestamp::new(100).unwrap());
        let live = TradeHistorySegment::new(Timestamp::new(50).unwrap());
        assert!(matches!(
            stored.merged_with_live(&live, Timestamp::new(200).unwrap()),
            Err(DataValidationError::DisjointSegments { .. })
        ));
    }
}
