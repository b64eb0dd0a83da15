//! Performance metrics — pure functions that compute strategy statistics.
//!
//! The engine keeps money in `Decimal`; statistics are ratios and square
//! roots, so they are computed on an `f64` view of the equity curve.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crossover_core::{BacktestReport, TradeRecord};

/// Bars per year used for annualisation (daily data).
pub const BARS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    /// Negative fraction, e.g. `-0.15` for a 15% peak-to-trough loss.
    pub max_drawdown: f64,
    /// Longest run of consecutive bars spent below a previous equity peak.
    pub max_drawdown_duration: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    /// Completed round trips.
    pub trade_count: usize,
    /// Fraction of bars with an open position.
    pub exposure: f64,
}

impl PerformanceMetrics {
    pub fn compute(report: &BacktestReport) -> Self {
        let curve: Vec<f64> = report
            .equity_curve
            .iter()
            .map(|p| to_f64(p.equity))
            .collect();
        Self::from_parts(&curve, &report.trades, report.bars_in_market())
    }

    /// Compute all metrics from an equity curve, the closed trades and the
    /// number of bars spent in the market.
    pub fn from_parts(equity_curve: &[f64], trades: &[TradeRecord], bars_in_market: usize) -> Self {
        let bars = equity_curve.len();
        Self {
            total_return: total_return(equity_curve),
            cagr: cagr(equity_curve),
            sharpe: sharpe_ratio(equity_curve, 0.0),
            sortino: sortino_ratio(equity_curve, 0.0),
            calmar: calmar_ratio(equity_curve),
            max_drawdown: max_drawdown(equity_curve),
            max_drawdown_duration: max_drawdown_duration(equity_curve),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            exposure: exposure(bars_in_market, bars),
        }
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&initial), Some(&final_eq)) if equity_curve.len() >= 2 && initial > 0.0 => {
            (final_eq - initial) / initial
        }
        _ => 0.0,
    }
}

/// Compound Annual Growth Rate.
///
/// Assumes 252 bars per year. Returns 0.0 for single-bar or non-positive equity.
pub fn cagr(equity_curve: &[f64]) -> f64 {
    let bars = equity_curve.len();
    if bars < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    let final_eq = equity_curve[equity_curve.len() - 1];
    if initial <= 0.0 || final_eq <= 0.0 {
        return 0.0;
    }
    let years = bars as f64 / BARS_PER_YEAR;
    (final_eq / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio from per-bar returns.
///
/// Sharpe = mean(returns - rf) / std(returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(equity_curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean_f64(&excess) / std) * BARS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
///
/// Returns 0.0 if there are no losing bars.
pub fn sortino_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(equity_curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside_sq / excess.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    (mean_f64(&excess) / downside_std) * BARS_PER_YEAR.sqrt()
}

/// Calmar ratio: CAGR / |max_drawdown|.
///
/// Returns 0.0 if max drawdown is zero or CAGR is non-positive.
pub fn calmar_ratio(equity_curve: &[f64]) -> f64 {
    let c = cagr(equity_curve);
    let dd = max_drawdown(equity_curve);
    if dd >= 0.0 || c <= 0.0 {
        return 0.0;
    }
    c / dd.abs()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Longest stretch of bars spent below the running equity peak.
pub fn max_drawdown_duration(equity_curve: &[f64]) -> usize {
    let mut peak = f64::MIN;
    let mut below = 0;
    let mut longest = 0;
    for &eq in equity_curve {
        if eq >= peak {
            peak = eq;
            below = 0;
        } else {
            below += 1;
            longest = longest.max(below);
        }
    }
    longest
}

/// Win rate: fraction of round trips with positive net P&L.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 when there are no losses.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: Decimal = trades
        .iter()
        .filter(|t| t.net_pnl > Decimal::ZERO)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: Decimal = trades
        .iter()
        .filter(|t| t.net_pnl < Decimal::ZERO)
        .map(|t| t.net_pnl.abs())
        .sum();

    if gross_loss.is_zero() {
        return if gross_profit > Decimal::ZERO { 100.0 } else { 0.0 };
    }
    (to_f64(gross_profit) / to_f64(gross_loss)).min(100.0)
}

/// Fraction of bars with an open position.
pub fn exposure(bars_in_market: usize, bars: usize) -> f64 {
    if bars == 0 {
        return 0.0;
    }
    bars_in_market as f64 / bars as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Per-bar simple returns from an equity curve.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn excess_returns(equity_curve: &[f64], risk_free_rate: f64) -> Vec<f64> {
    let per_bar_rf = risk_free_rate / BARS_PER_YEAR;
    bar_returns(equity_curve)
        .into_iter()
        .map(|r| r - per_bar_rf)
        .collect()
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
