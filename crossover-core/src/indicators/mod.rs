//! Indicator pipeline.
//!
//! The `IndicatorEngine` owns one `RollingSma` per configured period and is
//! fed one bar per step by the simulator. Each update is O(1) per window and
//! returns a `ReadyState` view the strategy reads from. Readings are only
//! defined once a window has seen `period` closes.

pub mod sma;

pub use sma::RollingSma;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::error::ConfigError;

/// Current value of one moving average. `value` is `None` until the window is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaReading {
    pub period: usize,
    pub value: Option<Decimal>,
}

impl SmaReading {
    pub fn ready(period: usize, value: Decimal) -> Self {
        Self {
            period,
            value: Some(value),
        }
    }

    pub fn warming_up(period: usize) -> Self {
        Self {
            period,
            value: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }
}

/// Readings produced by one `IndicatorEngine::update`.
#[derive(Debug, Clone, Copy)]
pub struct ReadyState<'a> {
    readings: &'a [SmaReading],
}

impl<'a> ReadyState<'a> {
    pub fn new(readings: &'a [SmaReading]) -> Self {
        Self { readings }
    }

    /// Reading for `period`, if the engine tracks it.
    pub fn get(&self, period: usize) -> Option<SmaReading> {
        self.readings.iter().find(|r| r.period == period).copied()
    }

    pub fn all_ready(&self) -> bool {
        self.readings.iter().all(SmaReading::is_ready)
    }
}

/// Rolling moving averages over the closes of a bar stream.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    windows: Vec<RollingSma>,
    readings: Vec<SmaReading>,
    bars_seen: usize,
}

impl IndicatorEngine {
    /// One window per distinct period, kept in ascending period order.
    pub fn new(periods: &[usize]) -> Result<Self, ConfigError> {
        let mut distinct = periods.to_vec();
        distinct.sort_unstable();
        distinct.dedup();

        let windows = distinct
            .iter()
            .map(|&p| RollingSma::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let readings = distinct.iter().map(|&p| SmaReading::warming_up(p)).collect();

        Ok(Self {
            windows,
            readings,
            bars_seen: 0,
        })
    }

    /// Feed the next bar's close into every window.
    ///
    /// The caller is responsible for chronological order; `BarSeries`
    /// guarantees it for simulator runs.
    pub fn update(&mut self, bar: &Bar) -> ReadyState<'_> {
        for (window, reading) in self.windows.iter_mut().zip(self.readings.iter_mut()) {
            reading.value = window.push(bar.close);
        }
        self.bars_seen += 1;
        ReadyState::new(&self.readings)
    }

    /// Latest reading for `period` without advancing.
    pub fn reading(&self, period: usize) -> Option<SmaReading> {
        ReadyState::new(&self.readings).get(period)
    }

    pub fn tracks(&self, period: usize) -> bool {
        self.windows.iter().any(|w| w.period() == period)
    }

    pub fn periods(&self) -> Vec<usize> {
        self.windows.iter().map(RollingSma::period).collect()
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close (or close for the first bar), high/low = ±1 around
/// open and close, one bar per day from 2024-01-02.
#[cfg(test)]
pub(crate) fn make_bars(closes: &[Decimal]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + Decimal::ONE,
                low: open.min(close) - Decimal::ONE,
                close,
                volume: 1000,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn update_reports_each_period() {
        let mut engine = IndicatorEngine::new(&[3, 2]).unwrap();
        let bars = make_bars(&[dec!(10), dec!(20), dec!(30)]);

        let state = engine.update(&bars[0]);
        assert!(!state.all_ready());
        assert_eq!(state.get(2), Some(SmaReading::warming_up(2)));

        let state = engine.update(&bars[1]);
        assert_eq!(state.get(2), Some(SmaReading::ready(2, dec!(15))));
        assert!(!state.get(3).unwrap().is_ready());

        let state = engine.update(&bars[2]);
        assert!(state.all_ready());
        assert_eq!(state.get(2).unwrap().value, Some(dec!(25)));
        assert_eq!(state.get(3).unwrap().value, Some(dec!(20)));
        assert_eq!(engine.bars_seen(), 3);
    }

    #[test]
    fn periods_are_sorted_and_deduplicated() {
        let engine = IndicatorEngine::new(&[200, 50, 200]).unwrap();
        assert_eq!(engine.periods(), vec![50, 200]);
        assert!(engine.tracks(50));
        assert!(!engine.tracks(100));
    }

    #[test]
    fn untracked_period_has_no_reading() {
        let mut engine = IndicatorEngine::new(&[2]).unwrap();
        let bar = make_bars(&[dec!(10)]).remove(0);
        assert!(engine.update(&bar).get(5).is_none());
        assert!(engine.reading(5).is_none());
    }

    #[test]
    fn zero_period_rejected() {
        assert!(IndicatorEngine::new(&[0, 5]).is_err());
    }

    #[test]
    fn reading_matches_last_update() {
        let mut engine = IndicatorEngine::new(&[2]).unwrap();
        for bar in make_bars(&[dec!(4), dec!(6), dec!(8)]) {
            engine.update(&bar);
        }
        assert_eq!(engine.reading(2), Some(SmaReading::ready(2, dec!(7))));
    }
}
