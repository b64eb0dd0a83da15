//! Error taxonomy for configuration, data integrity and execution.
//!
//! Configuration and data errors are fatal and abort a run before any equity
//! is computed. `BrokerError::InsufficientFunds` is the one recoverable case:
//! the simulator downgrades it to a Hold and keeps going.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

/// Invalid parameters, rejected when a component is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("period must be > 0")]
    ZeroPeriod,

    #[error("slow_period ({slow}) must be greater than fast_period ({fast})")]
    SlowNotAboveFast { fast: usize, slow: usize },

    #[error("commission_rate must be in [0, 1), got {0}")]
    CommissionOutOfRange(Decimal),

    #[error("initial_cash must be > 0, got {0}")]
    NonPositiveCash(Decimal),

    #[error("strategy requires a {0}-bar moving average the indicator engine does not track")]
    MissingIndicator(usize),
}

/// Failures raised by `Broker::execute`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("insufficient funds: cash {cash} cannot buy one unit at {price}")]
    InsufficientFunds { cash: Decimal, price: Decimal },

    #[error("buy rejected: a position is already open")]
    PositionAlreadyOpen,

    #[error("sell rejected: no open position")]
    NoPosition,
}

/// Errors that abort a backtest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BacktestError {
    #[error("bar series is empty")]
    EmptyDataset,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("bar {index} at {current} does not follow previous bar at {previous}")]
    NonMonotonicData {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("bar {index} at {timestamp} has inconsistent OHLC prices")]
    InvalidBar {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("simulator has already run; construct a new one to replay")]
    AlreadyRun,

    #[error("broker error at bar {bar_index}: {source}")]
    Broker {
        bar_index: usize,
        #[source]
        source: BrokerError,
    },
}
