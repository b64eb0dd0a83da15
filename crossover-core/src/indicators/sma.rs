//! Simple Moving Average (SMA), updated one close at a time.
//!
//! Keeps the last `period` closes and their running sum. Decimal addition and
//! subtraction are exact, so the running sum never drifts from a fresh sum
//! over the window.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::domain::Bar;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct RollingSma {
    period: usize,
    window: VecDeque<Decimal>,
    sum: Decimal,
}

impl RollingSma {
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self {
            period,
            window: VecDeque::new(),
            sum: Decimal::ZERO,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Append a close, evicting the oldest once the window is over `period`.
    /// Returns the mean if the window is full.
    pub fn push(&mut self, close: Decimal) -> Option<Decimal> {
        self.window.push_back(close);
        self.sum += close;
        if self.window.len() > self.period {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= evicted;
            }
        }
        self.value()
    }

    /// Window holds exactly `period` samples.
    pub fn is_ready(&self) -> bool {
        self.window.len() == self.period
    }

    /// Mean of the window, or `None` during warmup.
    pub fn value(&self) -> Option<Decimal> {
        if self.is_ready() {
            Some(self.sum / Decimal::from(self.period))
        } else {
            None
        }
    }

    /// Batch form over a full bar slice, from a fresh window. Element `i`
    /// only ever sees closes `0..=i`.
    pub fn compute(period: usize, bars: &[Bar]) -> Result<Vec<Option<Decimal>>, ConfigError> {
        let mut sma = Self::new(period)?;
        Ok(bars.iter().map(|bar| sma.push(bar.close)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use rust_decimal_macros::dec;

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[
            dec!(10),
            dec!(11),
            dec!(12),
            dec!(13),
            dec!(14),
            dec!(15),
            dec!(16),
        ]);
        let result = RollingSma::compute(5, &bars).unwrap();

        assert_eq!(result.len(), 7);
        assert!(result[..4].iter().all(Option::is_none));
        assert_eq!(result[4], Some(dec!(12)));
        assert_eq!(result[5], Some(dec!(13)));
        assert_eq!(result[6], Some(dec!(14)));
    }

    #[test]
    fn sma_1_is_close() {
        let mut sma = RollingSma::new(1).unwrap();
        assert_eq!(sma.push(dec!(100)), Some(dec!(100)));
        assert_eq!(sma.push(dec!(200)), Some(dec!(200)));
    }

    #[test]
    fn ready_exactly_at_period() {
        let mut sma = RollingSma::new(3).unwrap();
        assert_eq!(sma.push(dec!(1)), None);
        assert!(!sma.is_ready());
        assert_eq!(sma.push(dec!(2)), None);
        assert_eq!(sma.push(dec!(3)), Some(dec!(2)));
        assert!(sma.is_ready());
    }

    #[test]
    fn eviction_keeps_window_at_period() {
        let mut sma = RollingSma::new(2).unwrap();
        for close in [dec!(1), dec!(2), dec!(3), dec!(4)] {
            sma.push(close);
        }
        assert_eq!(sma.value(), Some(dec!(3.5)));
        assert_eq!(sma.window.len(), 2);
    }

    #[test]
    fn running_sum_has_no_drift() {
        let mut sma = RollingSma::new(3).unwrap();
        for _ in 0..10_000 {
            sma.push(dec!(0.1));
        }
        assert_eq!(sma.value(), Some(dec!(0.1)));
    }

    #[test]
    fn huge_period_never_becomes_ready() {
        let mut sma = RollingSma::new(usize::MAX).unwrap();
        for close in [dec!(1), dec!(2), dec!(3)] {
            assert_eq!(sma.push(close), None);
        }
        assert!(!sma.is_ready());
        assert_eq!(sma.window.len(), 3);
    }

    #[test]
    fn zero_period_rejected() {
        assert_eq!(RollingSma::new(0).unwrap_err(), ConfigError::ZeroPeriod);
    }
}
