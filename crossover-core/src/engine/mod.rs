//! Backtesting engine — the simulator loop and the report it produces.

pub mod report;
pub mod simulator;

pub use report::BacktestReport;
pub use simulator::{SimState, Simulator};
