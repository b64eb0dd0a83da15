//! Moving average crossover — long while the fast SMA is above the slow SMA.
//!
//! The rule is level-based: a flat book buys whenever fast > slow, an open
//! position is closed whenever fast < slow. Equality is never a crossover in
//! either direction.

use crate::config::validate_periods;
use crate::error::ConfigError;
use crate::indicators::{ReadyState, SmaReading};

use super::{Action, Strategy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, ConfigError> {
        validate_periods(fast_period, slow_period)?;
        Ok(Self {
            fast_period,
            slow_period,
        })
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn required_periods(&self) -> Vec<usize> {
        vec![self.fast_period, self.slow_period]
    }

    fn decide(&self, ready: &ReadyState<'_>, has_position: bool) -> Action {
        let fast = ready
            .get(self.fast_period)
            .unwrap_or(SmaReading::warming_up(self.fast_period));
        let slow = ready
            .get(self.slow_period)
            .unwrap_or(SmaReading::warming_up(self.slow_period));
        crossover_decision(fast, slow, has_position)
    }
}

/// The crossover rule, evaluated in order:
/// 1. either average still warming up → Hold
/// 2. flat and fast > slow → Buy
/// 3. holding and fast < slow → Sell
/// 4. otherwise → Hold
pub fn crossover_decision(fast: SmaReading, slow: SmaReading, has_position: bool) -> Action {
    let (Some(fast), Some(slow)) = (fast.value, slow.value) else {
        return Action::Hold;
    };

    if !has_position && fast > slow {
        Action::Buy
    } else if has_position && fast < slow {
        Action::Sell
    } else {
        Action::Hold
    }
}
