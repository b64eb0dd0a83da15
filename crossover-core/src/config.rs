//! Validated backtest parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which bar's price a decision is filled at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillTiming {
    /// Decision at bar T's close, fill at bar T+1's open. No look-ahead.
    #[default]
    NextBarOpen,
    /// Decision and fill at bar T's close. Optimistic: the close that
    /// produced the signal is also the execution price.
    SameBarClose,
}

impl FillTiming {
    pub fn name(&self) -> &'static str {
        match self {
            FillTiming::NextBarOpen => "next_bar_open",
            FillTiming::SameBarClose => "same_bar_close",
        }
    }
}

/// Parameters for one crossover backtest.
///
/// Missing fields deserialize to the defaults (50/200, 1%, 10 000).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    /// Fraction of notional charged on every fill, e.g. `0.01` for 1%.
    pub commission_rate: Decimal,
    pub initial_cash: Decimal,
    pub fill_timing: FillTiming,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            fast_period: 50,
            slow_period: 200,
            commission_rate: Decimal::new(1, 2),
            initial_cash: Decimal::new(10_000, 0),
            fill_timing: FillTiming::NextBarOpen,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_periods(self.fast_period, self.slow_period)?;
        validate_commission(self.commission_rate)?;
        validate_cash(self.initial_cash)
    }
}

pub(crate) fn validate_periods(fast: usize, slow: usize) -> Result<(), ConfigError> {
    if fast == 0 {
        return Err(ConfigError::ZeroPeriod);
    }
    if slow <= fast {
        return Err(ConfigError::SlowNotAboveFast { fast, slow });
    }
    Ok(())
}

pub(crate) fn validate_commission(rate: Decimal) -> Result<(), ConfigError> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(ConfigError::CommissionOutOfRange(rate));
    }
    Ok(())
}

pub(crate) fn validate_cash(cash: Decimal) -> Result<(), ConfigError> {
    if cash <= Decimal::ZERO {
        return Err(ConfigError::NonPositiveCash(cash));
    }
    Ok(())
}
