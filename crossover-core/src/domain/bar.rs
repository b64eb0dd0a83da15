//! Bar and BarSeries — the market data the engine replays.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// OHLCV bar for one fixed time interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl Bar {
    /// Basic OHLC sanity check: positive prices, high/low bracket open and close.
    pub fn is_sane(&self) -> bool {
        self.open > Decimal::ZERO
            && self.close > Decimal::ZERO
            && self.low > Decimal::ZERO
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Ordered, immutable sequence of bars with strictly increasing timestamps.
///
/// Validation happens once, at construction. After that the series is
/// read-only: the engine only ever borrows bars from it.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate ordering and bar sanity. An empty series is accepted here;
    /// the simulator rejects it when a run is requested.
    pub fn new(bars: Vec<Bar>) -> Result<Self, BacktestError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BacktestError::InvalidBar {
                    index,
                    timestamp: bar.timestamp,
                });
            }
            if index > 0 {
                let previous = bars[index - 1].timestamp;
                if bar.timestamp <= previous {
                    return Err(BacktestError::NonMonotonicData {
                        index,
                        previous,
                        current: bar.timestamp,
                    });
                }
            }
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    /// The first `len` bars as a new series. Ordering is inherited, so no
    /// revalidation is needed.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
