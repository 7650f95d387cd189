//! Timed input update stream.
//!
//! Merges finite per-input timed event sequences into a single replay
//! stream with non-decreasing time. Events with equal time are ordered by
//! `(kind_rank, input_key)`, which makes the merge a deterministic
//! function of its sources.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use sirocco_core::data::{CandleHistorySegment, TradeHistorySegment};
use sirocco_core::types::{CandleLength, Timestamp};

use crate::input::{Input, Value};

/// One timed update: at `time`, `input` takes `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputUpdate {
    /// Event time
    pub time: Timestamp,
    /// Input being updated
    pub input: Input,
    /// New value of the input
    pub value: Value,
}

/// Heap ordering key: earliest time first, then kind rank, then input key.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct HeapKey {
    time: Timestamp,
    kind_rank: u8,
    key: String,
    source: usize,
}

struct Source {
    input: Input,
    kind_rank: u8,
    key: String,
    events: Vec<Option<(Timestamp, Value)>>,
    cursor: usize,
}

/// Merged, finite stream of input updates for one simulation interval.
pub struct TimedUpdateStream {
    sources: Vec<Source>,
    heap: BinaryHeap<Reverse<HeapKey>>,
}

impl TimedUpdateStream {
    /// Creates a stream from per-input event sequences.
    ///
    /// Each per-input sequence must already be ordered by time; the
    /// builders in this module produce such sequences.
    #[must_use]
    pub fn new(per_input: Vec<(Input, Vec<(Timestamp, Value)>)>) -> Self {
        let sources: Vec<Source> = per_input
            .into_iter()
            .map(|(input, events)| Source {
                kind_rank: input.kind_rank(),
                key: input.key(),
                events: events.into_iter().map(Some).collect(),
                cursor: 0,
                input,
            })
            .collect();
        let mut stream = Self {
            sources,
            heap: BinaryHeap::new(),
        };
        for index in 0..stream.sources.len() {
            stream.enqueue(index);
        }
        stream
    }

    fn enqueue(&mut self, source_index: usize) {
        let source = &self.sources[source_index];
        if let Some(Some((time, _))) = source.events.get(source.cursor) {
            self.heap.push(Reverse(HeapKey {
                time: *time,
                kind_rank: source.kind_rank,
                key: source.key.clone(),
                source: source_index,
            }));
        }
    }

    /// Returns the next update, or `None` when the stream is exhausted.
    pub fn next_update(&mut self) -> Option<InputUpdate> {
        let Reverse(key) = self.heap.pop()?;
        let source = &mut self.sources[key.source];
        let (time, value) = source.events[source.cursor].take()?;
        source.cursor += 1;
        let input = source.input.clone();
        self.enqueue(key.source);
        Some(InputUpdate { time, input, value })
    }

    /// Total number of events not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.sources
            .iter()
            .map(|source| source.events.len() - source.cursor)
            .sum()
    }

    /// Events for a time input: one tick at every multiple of `resolution`
    /// within `[start, end]`.
    #[must_use]
    pub fn time_events(
        resolution: CandleLength,
        start: Timestamp,
        end: Timestamp,
    ) -> Vec<(Timestamp, Value)> {
        let mut events = Vec::new();
        let mut tick = if start.is_aligned_to(resolution) {
            start
        } else {
            start.floor_to(resolution).plus(resolution)
        };
        while tick <= end {
            events.push((tick, Value::Time(tick)));
            tick = tick.plus(resolution);
        }
        events
    }

    /// Events for a candle history input: at each candle's close time, the
    /// segment grown to include that candle. Events outside `[start, end]`
    /// are omitted.
    #[must_use]
    pub fn candle_events(
        segment: &CandleHistorySegment,
        start: Timestamp,
        end: Timestamp,
    ) -> Vec<(Timestamp, Value)> {
        segment
            .as_slice()
            .iter()
            .enumerate()
            .filter_map(|(index, candle)| {
                let close = candle.close_time();
                if close < start || close > end {
                    return None;
                }
                Some((close, Value::Candles(segment.prefix(index + 1))))
            })
            .collect()
    }

    /// Events for a trade history input: one event per distinct trade
    /// time, with the segment grown to include every trade at that time.
    #[must_use]
    pub fn trade_events(
        segment: &TradeHistorySegment,
        start: Timestamp,
        end: Timestamp,
    ) -> Vec<(Timestamp, Value)> {
        let trades = segment.as_slice();
        let mut events = Vec::new();
        let mut index = 0;
        while index < trades.len() {
            let time = trades[index].time;
            let mut last = index;
            while last + 1 < trades.len() && trades[last + 1].time == time {
                last += 1;
            }
            if time >= start && time <= end {
                events.push((time, Value::Trades(segment.prefix(last + 1))));
            }
            index = last + 1;
        }
        events
    }
}

impl Iterator for TimedUpdateStream {
    type Item = InputUpdate;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_update()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sirocco_core::data::{Candle, Trade};
    use sirocco_core::types::{Amount, Market, Price, Quantity, TradeId};

    fn market() -> Market {
        "binance:BTC-USD".parse().unwrap()
    }

    fn candle(start_ms: i64) -> Candle {
        Candle::builder()
            .start_time(Timestamp::new_unchecked(start_ms))
            .length(CandleLength::MINUTE_1)
            .open(Price::new_unchecked(dec!(100)))
            .high(Price::new_unchecked(dec!(101)))
            .low(Price::new_unchecked(dec!(99)))
            .close(Price::new_unchecked(dec!(100)))
            .quote_volume(Amount::new_unchecked(dec!(1000)))
            .build()
            .unwrap()
    }

    fn trade(id: &str, time_ms: i64) -> Trade {
        Trade {
            id: TradeId::new(id).unwrap(),
            time: Timestamp::new_unchecked(time_ms),
            market: market(),
            price: Price::new_unchecked(dec!(100)),
            quantity: Quantity::new_unchecked(dec!(1)),
            fees: Amount::ZERO,
            order_id: None,
        }
    }

    #[test]
    fn test_time_events_cover_every_multiple() {
        let events = TimedUpdateStream::time_events(
            CandleLength::MINUTE_1,
            Timestamp::new_unchecked(90_000),
            Timestamp::new_unchecked(300_000),
        );
        let times: Vec<i64> = events.iter().map(|(t, _)| t.as_millis()).collect();
        assert_eq!(times, vec![120_000, 180_000, 240_000, 300_000]);
    }

    #[test]
    fn test_time_events_first_may_equal_start() {
        let events = TimedUpdateStream::time_events(
            CandleLength::MINUTE_1,
            Timestamp::new_unchecked(120_000),
            Timestamp::new_unchecked(180_000),
        );
        assert_eq!(events[0].0.as_millis(), 120_000);
    }

    #[test]
    fn test_candle_events_grow_the_segment() {
        let segment = CandleHistorySegment::from_candles(
            Timestamp::ZERO,
            CandleLength::MINUTE_1,
            vec![candle(0), candle(60_000), candle(120_000)],
        )
        .unwrap();
        let events = TimedUpdateStream::candle_events(
            &segment,
            Timestamp::ZERO,
            Timestamp::new_unchecked(180_000),
        );
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].0.as_millis(), 60_000);
        for (index, (_, value)) in events.iter().enumerate() {
            let Value::Candles(prefix) = value else {
                panic!("expected candle segment");
            };
            assert_eq!(prefix.len(), index + 1);
        }
    }

    #[test]
    fn test_candle_events_omit_out_of_range() {
        let segment = CandleHistorySegment::from_candles(
            Timestamp::ZERO,
            CandleLength::MINUTE_1,
            vec![candle(0), candle(60_000), candle(120_000)],
        )
        .unwrap();
        let events = TimedUpdateStream::candle_events(
            &segment,
            Timestamp::new_unchecked(120_000),
            Timestamp::new_unchecked(150_000),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0.as_millis(), 120_000);
    }

    #[test]
    fn test_trade_events_group_equal_times() {
        let segment = TradeHistorySegment::from_trades(
            Timestamp::ZERO,
            vec![trade("a", 100), trade("b", 100), trade("c", 200)],
        )
        .unwrap();
        let events = TimedUpdateStream::trade_events(
            &segment,
            Timestamp::ZERO,
            Timestamp::new_unchecked(300),
        );
        assert_eq!(events.len(), 2);
        let Value::Trades(first) = &events[0].1 else {
            panic!("expected trade segment");
        };
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_merge_is_monotonic_and_kind_ordered() {
        let time_input = Input::Time(CandleLength::MINUTE_1);
        let candle_input = Input::CandleHistory {
            market: market(),
            candle_length: CandleLength::MINUTE_1,
            start: Timestamp::ZERO,
        };
        let segment = CandleHistorySegment::from_candles(
            Timestamp::ZERO,
            CandleLength::MINUTE_1,
            vec![candle(0), candle(60_000)],
        )
        .unwrap();

        let end = Timestamp::new_unchecked(120_000);
        let mut stream = TimedUpdateStream::new(vec![
            (
                candle_input.clone(),
                TimedUpdateStream::candle_events(&segment, Timestamp::ZERO, end),
            ),
            (
                time_input.clone(),
                TimedUpdateStream::time_events(CandleLength::MINUTE_1, Timestamp::ZERO, end),
            ),
        ]);

        let updates: Vec<InputUpdate> = stream.by_ref().collect();
        let times: Vec<i64> = updates.iter().map(|u| u.time.as_millis()).collect();
        assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));

        // At t=60_000 both inputs fire; the time input (rank 0) precedes
        // the candle input (rank 1).
        let at_minute: Vec<&Input> = updates
            .iter()
            .filter(|u| u.time.as_millis() == 60_000)
            .map(|u| &u.input)
            .collect();
        assert_eq!(at_minute, vec![&time_input, &candle_input]);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let run = || {
            let time_input = Input::Time(CandleLength::MINUTE_1);
            let other = Input::Time(CandleLength::MINUTE_5);
            let end = Timestamp::new_unchecked(600_000);
            let stream = TimedUpdateStream::new(vec![
                (
                    other.clone(),
                    TimedUpdateStream::time_events(CandleLength::MINUTE_5, Timestamp::ZERO, end),
                ),
                (
                    time_input.clone(),
                    TimedUpdateStream::time_events(CandleLength::MINUTE_1, Timestamp::ZERO, end),
                ),
            ]);
            stream
                .map(|u| (u.time.as_millis(), u.input.key()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
