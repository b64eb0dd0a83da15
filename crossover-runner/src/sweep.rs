//! Parameter sweep over fast/slow periods and commission rates.
//!
//! Every combination runs as an independent backtest with its own clone of
//! the series, indicator engine, broker and simulator, so the grid can be
//! spread across threads with rayon.

use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::info;

use crossover_core::{BacktestConfig, BarSeries};

use crate::runner::{run_backtest, BacktestResult, RunError};

/// Parameter grid specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamGrid {
    pub fast_periods: Vec<usize>,
    pub slow_periods: Vec<usize>,
    /// Empty means "use the base config's rate".
    pub commission_rates: Vec<Decimal>,
}

impl ParamGrid {
    /// Fast 10/20/50 against slow 100/150/200.
    pub fn ma_crossover_default() -> Self {
        Self {
            fast_periods: vec![10, 20, 50],
            slow_periods: vec![100, 150, 200],
            commission_rates: Vec::new(),
        }
    }

    /// Upper bound on the number of configurations, before invalid pairs are dropped.
    pub fn size(&self) -> usize {
        self.fast_periods.len() * self.slow_periods.len() * self.commission_rates.len().max(1)
    }

    /// Generates all valid configurations in the grid.
    ///
    /// Pairs with `slow <= fast` are skipped. Everything not swept is copied
    /// from `base`.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let rates = if self.commission_rates.is_empty() {
            vec![base.commission_rate]
        } else {
            self.commission_rates.clone()
        };

        let mut configs = Vec::new();
        for &fast in &self.fast_periods {
            for &slow in &self.slow_periods {
                if fast == 0 || slow <= fast {
                    continue;
                }
                for &commission_rate in &rates {
                    configs.push(BacktestConfig {
                        fast_period: fast,
                        slow_period: slow,
                        commission_rate,
                        ..base.clone()
                    });
                }
            }
        }
        configs
    }
}

/// Parameter sweep executor.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    grid: ParamGrid,
    parallel: bool,
}

impl ParamSweep {
    pub fn new(grid: ParamGrid) -> Self {
        Self {
            grid,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every configuration in the grid over `series`.
    ///
    /// Results come back in grid order whether or not the sweep ran in
    /// parallel. The first failing run aborts the sweep.
    pub fn run(
        &self,
        series: &BarSeries,
        symbol: &str,
        base: &BacktestConfig,
    ) -> Result<SweepResults, RunError> {
        let configs = self.grid.generate_configs(base);
        info!(
            configs = configs.len(),
            parallel = self.parallel,
            "parameter sweep started"
        );

        let results: Vec<BacktestResult> = if self.parallel {
            configs
                .par_iter()
                .map(|config| run_backtest(series, symbol, config))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            configs
                .iter()
                .map(|config| run_backtest(series, symbol, config))
                .collect::<Result<Vec<_>, _>>()?
        };

        info!(runs = results.len(), "parameter sweep finished");
        Ok(SweepResults::new(results))
    }
}

/// What to rank sweep results by. Higher is better for every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    FinalEquity,
    TotalReturn,
    Sharpe,
    /// Smallest drawdown first.
    MaxDrawdown,
}

impl RankBy {
    fn score(self, result: &BacktestResult) -> f64 {
        match self {
            RankBy::FinalEquity | RankBy::TotalReturn => result.metrics.total_return,
            RankBy::Sharpe => result.metrics.sharpe,
            RankBy::MaxDrawdown => result.metrics.max_drawdown,
        }
    }
}

/// Results from a parameter sweep.
#[derive(Debug, Clone)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        Self { results }
    }

    /// Returns all results in grid order.
    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Gets a result by run id.
    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.results.iter().find(|r| r.run_id == run_id)
    }

    /// Results sorted best-first. Ties keep grid order.
    pub fn sorted_by(&self, rank: RankBy) -> Vec<&BacktestResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        match rank {
            RankBy::FinalEquity => {
                sorted.sort_by(|a, b| b.report.final_equity.cmp(&a.report.final_equity));
            }
            _ => sorted.sort_by(|a, b| rank.score(b).total_cmp(&rank.score(a))),
        }
        sorted
    }

    /// Returns the top N results.
    pub fn top_n(&self, rank: RankBy, n: usize) -> Vec<&BacktestResult> {
        self.sorted_by(rank).into_iter().take(n).collect()
    }

    /// Returns the best result.
    pub fn best_by(&self, rank: RankBy) -> Option<&BacktestResult> {
        self.sorted_by(rank).into_iter().next()
    }
}
