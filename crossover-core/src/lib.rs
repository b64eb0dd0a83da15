//! Crossover Core — bar series, rolling indicators, strategy, broker, event loop.
//!
//! This crate contains the backtesting engine:
//! - Domain types (bars, positions, fills, round-trip trades, equity points)
//! - `IndicatorEngine`: O(1) rolling simple moving averages
//! - `Strategy` trait and the moving-average crossover rule
//! - `Broker`: cash/position ledger with exact decimal commission accounting
//! - `Simulator`: single-pass, forward-only bar loop producing a `BacktestReport`

pub mod broker;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod strategy;

pub use broker::{Broker, Execution, Ledger};
pub use config::{BacktestConfig, FillTiming};
pub use domain::{Bar, BarSeries, EquityPoint, Fill, Position, Side, TradeRecord};
pub use engine::{BacktestReport, SimState, Simulator};
pub use error::{BacktestError, BrokerError, ConfigError};
pub use indicators::{IndicatorEngine, ReadyState, SmaReading};
pub use strategy::{crossover_decision, Action, MaCrossover, Strategy};
