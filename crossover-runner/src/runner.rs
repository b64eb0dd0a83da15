//! Backtest runner — wires together data, engine, fingerprints and metrics.
//!
//! Two entry points:
//! - `run_from_config()`: loads the CSV named in a `RunConfig`, then runs. Used by the CLI.
//! - `run_backtest()`: takes a pre-loaded series. Used by sweeps and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crossover_core::fingerprint::{curve_hash, dataset_hash};
use crossover_core::{BacktestConfig, BacktestError, BacktestReport, BarSeries, Simulator};

use crate::config::{run_id, RunConfig, RunConfigError, RunId};
use crate::data_loader::{load_bars_csv, LoadError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub config: BacktestConfig,
    pub dataset_hash: String,
    /// Fingerprint of the equity curve; equal for identical replays.
    pub curve_hash: String,
    pub bar_count: usize,
    pub start_date: String,
    pub end_date: String,
    pub metrics: PerformanceMetrics,
    pub report: BacktestReport,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a backtest from a `RunConfig` (loads the CSV it names).
pub fn run_from_config(config: &RunConfig) -> Result<BacktestResult, RunError> {
    config.backtest.validate().map_err(RunConfigError::from)?;
    let series = load_bars_csv(&config.data.path)?;
    run_backtest(&series, &config.data.symbol, &config.backtest)
}

/// Run a backtest over pre-loaded bars. No I/O.
pub fn run_backtest(
    series: &BarSeries,
    symbol: &str,
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    let report = Simulator::from_config(series.clone(), config)?.run()?;
    let metrics = PerformanceMetrics::compute(&report);

    let start_date = series
        .first()
        .map(|b| b.timestamp.to_string())
        .unwrap_or_default();
    let end_date = series
        .last()
        .map(|b| b.timestamp.to_string())
        .unwrap_or_default();

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: run_id(symbol, config),
        symbol: symbol.to_string(),
        config: config.clone(),
        dataset_hash: dataset_hash(series),
        curve_hash: curve_hash(&report.equity_curve),
        bar_count: series.len(),
        start_date,
        end_date,
        metrics,
        report,
    })
}
