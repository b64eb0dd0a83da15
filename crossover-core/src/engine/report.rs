//! Run output handed to reporting and metrics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::FillTiming;
use crate::domain::{EquityPoint, Fill, Position, TradeRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub strategy: String,
    pub initial_equity: Decimal,
    pub final_equity: Decimal,
    pub final_cash: Decimal,
    /// Position still open after the last bar, marked in `final_equity`.
    pub final_position: Option<Position>,
    /// One point per bar, in bar order.
    pub equity_curve: Vec<EquityPoint>,
    /// Number of executed fills (entries plus exits).
    pub trade_count: usize,
    pub fills: Vec<Fill>,
    /// Closed round trips.
    pub trades: Vec<TradeRecord>,
    /// Buy decisions dropped because cash could not cover one unit.
    pub skipped_trades: usize,
    /// The rate the broker applied to every fill.
    pub commission_rate: Decimal,
    pub total_commission: Decimal,
    pub fill_timing: FillTiming,
}

impl BacktestReport {
    pub fn net_profit(&self) -> Decimal {
        self.final_equity - self.initial_equity
    }

    pub fn bar_count(&self) -> usize {
        self.equity_curve.len()
    }

    /// Number of bars that closed with a position on the books.
    pub fn bars_in_market(&self) -> usize {
        let mut in_market = 0;
        for trade in &self.trades {
            in_market += trade.exit_bar - trade.entry_bar;
        }
        if let Some(position) = &self.final_position {
            in_market += self.equity_curve.len() - position.entry_bar;
        }
        in_market
    }
}
