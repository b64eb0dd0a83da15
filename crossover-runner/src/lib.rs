//! Crossover Runner — backtest orchestration, metrics, sweeps, artifacts.
//!
//! This crate builds on `crossover-core` to provide:
//! - TOML run configuration with content-addressed run ids
//! - CSV bar loading into a validated `BarSeries`
//! - Single-backtest runner bundling report, metrics and fingerprints
//! - Parallel parameter sweeps
//! - JSON/CSV artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{run_id, DataSection, OutputSection, RunConfig, RunConfigError, RunId};
pub use data_loader::{load_bars_csv, load_bars_from_reader, LoadError};
pub use export::{load_artifacts, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, run_from_config, BacktestResult, RunError, SCHEMA_VERSION};
pub use sweep::{ParamGrid, ParamSweep, RankBy, SweepResults};
