//! Bar-by-bar event loop.
//!
//! Per bar `t`, in order:
//! 1. Fill: a decision queued on bar `t-1` executes at bar `t`'s open
//!    (next-bar-open timing only).
//! 2. Indicators: bar `t`'s close enters every rolling window.
//! 3. Decide: the strategy maps readings and the position flag to an action.
//! 4. Route: queue the action for bar `t+1`, or fill it at bar `t`'s close
//!    under same-bar-close timing.
//! 5. Record: mark equity at bar `t`'s close.
//!
//! The loop index is the only cursor. Nothing at bar `t` reads bar `t+1`.

use tracing::{info, warn};

use crate::broker::{Broker, Execution};
use crate::config::{BacktestConfig, FillTiming};
use crate::domain::{Bar, BarSeries};
use crate::error::{BacktestError, BrokerError, ConfigError};
use crate::indicators::IndicatorEngine;
use crate::strategy::{Action, MaCrossover, Strategy};

use super::report::BacktestReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    NotStarted,
    Running,
    Finished,
}

/// Single-pass, forward-only backtest over one `BarSeries`.
///
/// Collaborators are injected at construction. A simulator runs once; replaying
/// means building a fresh one over the same series.
pub struct Simulator<S: Strategy> {
    series: BarSeries,
    indicators: IndicatorEngine,
    strategy: S,
    broker: Option<Broker>,
    state: SimState,
    skipped_trades: usize,
}

impl<S: Strategy> Simulator<S> {
    pub fn new(
        series: BarSeries,
        indicators: IndicatorEngine,
        strategy: S,
        broker: Broker,
    ) -> Result<Self, BacktestError> {
        if let Some(missing) = strategy
            .required_periods()
            .into_iter()
            .find(|&p| !indicators.tracks(p))
        {
            return Err(ConfigError::MissingIndicator(missing).into());
        }

        Ok(Self {
            series,
            indicators,
            strategy,
            broker: Some(broker),
            state: SimState::NotStarted,
            skipped_trades: 0,
        })
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    /// Replay every bar and build the report.
    pub fn run(&mut self) -> Result<BacktestReport, BacktestError> {
        if self.state != SimState::NotStarted {
            return Err(BacktestError::AlreadyRun);
        }
        if self.series.is_empty() {
            return Err(BacktestError::EmptyDataset);
        }
        let Some(mut broker) = self.broker.take() else {
            return Err(BacktestError::AlreadyRun);
        };

        self.state = SimState::Running;
        let timing = broker.fill_timing();
        info!(
            strategy = self.strategy.name(),
            bars = self.series.len(),
            timing = timing.name(),
            initial_cash = %broker.ledger().initial_cash(),
            commission_rate = %broker.ledger().commission_rate(),
            "backtest started"
        );

        let mut pending: Option<Action> = None;
        for (t, bar) in self.series.iter().enumerate() {
            if let Some(action) = pending.take() {
                self.skipped_trades += fill(&mut broker, action, t, bar)?;
            }

            let ready = self.indicators.update(bar);
            let action = self.strategy.decide(&ready, broker.has_position());

            if action != Action::Hold {
                match timing {
                    FillTiming::NextBarOpen => pending = Some(action),
                    FillTiming::SameBarClose => {
                        self.skipped_trades += fill(&mut broker, action, t, bar)?;
                    }
                }
            }

            broker.mark_to_market(bar);
        }

        if let Some(action) = pending {
            warn!(?action, "decision on the final bar has no next bar to fill at; dropped");
        }

        self.state = SimState::Finished;
        let report = self.build_report(broker);
        info!(
            final_equity = %report.final_equity,
            trade_count = report.trade_count,
            skipped_trades = report.skipped_trades,
            "backtest finished"
        );
        Ok(report)
    }

    fn build_report(&self, broker: Broker) -> BacktestReport {
        let fill_timing = broker.fill_timing();
        let (ledger, equity_curve, fills, trades) = broker.into_history();
        let final_equity = equity_curve
            .last()
            .map_or(ledger.cash(), |point| point.equity);

        BacktestReport {
            strategy: self.strategy.name().to_string(),
            initial_equity: ledger.initial_cash(),
            final_equity,
            final_cash: ledger.cash(),
            final_position: ledger.position().cloned(),
            equity_curve,
            trade_count: fills.len(),
            fills,
            trades,
            skipped_trades: self.skipped_trades,
            commission_rate: ledger.commission_rate(),
            total_commission: ledger.total_commission(),
            fill_timing,
        }
    }
}

impl Simulator<MaCrossover> {
    /// Standard wiring: crossover strategy, engine tracking its two periods,
    /// broker from the config. Validates the config first.
    pub fn from_config(series: BarSeries, config: &BacktestConfig) -> Result<Self, BacktestError> {
        config.validate()?;
        let strategy = MaCrossover::new(config.fast_period, config.slow_period)?;
        let indicators = IndicatorEngine::new(&strategy.required_periods())?;
        let broker = Broker::new(config.initial_cash, config.commission_rate, config.fill_timing)?;
        Self::new(series, indicators, strategy, broker)
    }
}

/// Execute one action. Returns 1 if it was skipped for lack of funds.
fn fill(broker: &mut Broker, action: Action, t: usize, bar: &Bar) -> Result<usize, BacktestError> {
    match broker.execute(action, t, bar) {
        Ok(Execution::Filled(_)) | Ok(Execution::NoTrade) => Ok(0),
        Err(BrokerError::InsufficientFunds { cash, price }) => {
            warn!(
                bar_index = t,
                timestamp = %bar.timestamp,
                %cash,
                %price,
                "skipped buy: insufficient funds for one unit"
            );
            Ok(1)
        }
        Err(source) => Err(BacktestError::Broker {
            bar_index: t,
            source,
        }),
    }
}
