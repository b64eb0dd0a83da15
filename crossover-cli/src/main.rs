//! Crossover CLI — run and sweep commands.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML config file or from flags
//! - `sweep` — run a grid of fast/slow periods (and commission rates) in parallel
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG=debug` to see every fill.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crossover_core::{BacktestConfig, FillTiming};
use crossover_runner::{
    load_bars_csv, run_from_config, save_artifacts, BacktestResult, DataSection, OutputSection,
    ParamGrid, ParamSweep, RankBy, RunConfig,
};

#[derive(Parser)]
#[command(
    name = "crossover",
    about = "Crossover CLI — moving-average crossover backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file or from flags.
    ///
    /// Flags override the matching config file values.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV file with Date,Open,High,Low,Close,Volume columns.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Symbol label for reports and run ids.
        #[arg(long)]
        symbol: Option<String>,

        /// Fast moving-average period.
        #[arg(long)]
        fast: Option<usize>,

        /// Slow moving-average period.
        #[arg(long)]
        slow: Option<usize>,

        /// Commission as a fraction of notional, e.g. 0.01 for 1%.
        #[arg(long)]
        commission: Option<Decimal>,

        /// Starting cash.
        #[arg(long)]
        cash: Option<Decimal>,

        /// When a decision is filled.
        #[arg(long, value_enum)]
        fill_timing: Option<FillTimingArg>,

        /// Output directory for artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the summary without writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Run every fast/slow (and commission) combination and rank the results.
    Sweep {
        /// CSV file with Date,Open,High,Low,Close,Volume columns.
        #[arg(long)]
        data: PathBuf,

        /// Symbol label for reports and run ids.
        #[arg(long, default_value = "UNKNOWN")]
        symbol: String,

        /// Fast periods, comma-separated.
        #[arg(long, value_delimiter = ',')]
        fast: Vec<usize>,

        /// Slow periods, comma-separated.
        #[arg(long, value_delimiter = ',')]
        slow: Vec<usize>,

        /// Commission rates, comma-separated. Defaults to 0.01.
        #[arg(long, value_delimiter = ',')]
        commission: Vec<Decimal>,

        /// Starting cash.
        #[arg(long)]
        cash: Option<Decimal>,

        /// When a decision is filled.
        #[arg(long, value_enum)]
        fill_timing: Option<FillTimingArg>,

        /// Run configurations one at a time instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Number of results to print.
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Ranking metric.
        #[arg(long, value_enum, default_value_t = RankArg::FinalEquity)]
        rank_by: RankArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FillTimingArg {
    NextBarOpen,
    SameBarClose,
}

impl From<FillTimingArg> for FillTiming {
    fn from(arg: FillTimingArg) -> Self {
        match arg {
            FillTimingArg::NextBarOpen => FillTiming::NextBarOpen,
            FillTimingArg::SameBarClose => FillTiming::SameBarClose,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RankArg {
    FinalEquity,
    Sharpe,
    MaxDrawdown,
}

impl From<RankArg> for RankBy {
    fn from(arg: RankArg) -> Self {
        match arg {
            RankArg::FinalEquity => RankBy::FinalEquity,
            RankArg::Sharpe => RankBy::Sharpe,
            RankArg::MaxDrawdown => RankBy::MaxDrawdown,
        }
    }
}

/// Parameter flags shared by `run` and `sweep`.
#[derive(Default)]
struct Overrides {
    fast: Option<usize>,
    slow: Option<usize>,
    commission: Option<Decimal>,
    cash: Option<Decimal>,
    fill_timing: Option<FillTimingArg>,
}

impl Overrides {
    fn apply(self, config: &mut BacktestConfig) {
        if let Some(fast) = self.fast {
            config.fast_period = fast;
        }
        if let Some(slow) = self.slow {
            config.slow_period = slow;
        }
        if let Some(rate) = self.commission {
            config.commission_rate = rate;
        }
        if let Some(cash) = self.cash {
            config.initial_cash = cash;
        }
        if let Some(timing) = self.fill_timing {
            config.fill_timing = timing.into();
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            symbol,
            fast,
            slow,
            commission,
            cash,
            fill_timing,
            output_dir,
            no_save,
        } => {
            let overrides = Overrides {
                fast,
                slow,
                commission,
                cash,
                fill_timing,
            };
            let run_config = build_run_config(config, data, symbol, output_dir, overrides)?;
            run_backtest_cmd(&run_config, !no_save)
        }
        Commands::Sweep {
            data,
            symbol,
            fast,
            slow,
            commission,
            cash,
            fill_timing,
            sequential,
            top,
            rank_by,
        } => {
            let mut base = BacktestConfig::default();
            Overrides {
                cash,
                fill_timing,
                ..Overrides::default()
            }
            .apply(&mut base);
            let defaults = ParamGrid::ma_crossover_default();
            let grid = ParamGrid {
                fast_periods: if fast.is_empty() { defaults.fast_periods } else { fast },
                slow_periods: if slow.is_empty() { defaults.slow_periods } else { slow },
                commission_rates: commission,
            };
            run_sweep_cmd(&data, &symbol, grid, &base, !sequential, top, rank_by.into())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn build_run_config(
    config_path: Option<PathBuf>,
    data: Option<PathBuf>,
    symbol: Option<String>,
    output_dir: Option<PathBuf>,
    overrides: Overrides,
) -> Result<RunConfig> {
    let mut config = match (config_path, data) {
        (Some(path), data) => {
            let mut config = RunConfig::from_file(&path)
                .with_context(|| format!("loading config {}", path.display()))?;
            if let Some(data) = data {
                config.data.path = data;
            }
            config
        }
        (None, Some(data)) => RunConfig {
            data: DataSection {
                path: data,
                symbol: "UNKNOWN".to_string(),
            },
            backtest: BacktestConfig::default(),
            output: OutputSection::default(),
        },
        (None, None) => bail!("one of --config or --data is required"),
    };

    if let Some(symbol) = symbol {
        config.data.symbol = symbol;
    }
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    overrides.apply(&mut config.backtest);
    config
        .backtest
        .validate()
        .context("invalid backtest parameters")?;
    Ok(config)
}

fn run_backtest_cmd(config: &RunConfig, save: bool) -> Result<()> {
    println!();
    println!("=== BACKTEST STARTED ===");
    println!(
        "Initial Portfolio Value: ${}",
        format_money(config.backtest.initial_cash)
    );

    let result = run_from_config(config)?;
    print_summary(&result);

    if save {
        let run_dir = save_artifacts(&result, &config.output.dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_sweep_cmd(
    data: &Path,
    symbol: &str,
    grid: ParamGrid,
    base: &BacktestConfig,
    parallel: bool,
    top: usize,
    rank: RankBy,
) -> Result<()> {
    let series =
        load_bars_csv(data).with_context(|| format!("loading bars from {}", data.display()))?;
    let results = ParamSweep::new(grid)
        .with_parallelism(parallel)
        .run(&series, symbol, base)?;

    if results.is_empty() {
        bail!("no valid fast/slow combinations in the grid (slow must exceed fast)");
    }

    println!();
    println!("=== Sweep: {} runs over {} bars ===", results.len(), series.len());
    println!(
        "{:>4}  {:>5}  {:>5}  {:>10}  {:>16}  {:>8}  {:>8}  {:>6}",
        "rank", "fast", "slow", "commission", "final value", "return", "max dd", "trades"
    );
    for (i, r) in results.top_n(rank, top).iter().enumerate() {
        println!(
            "{:>4}  {:>5}  {:>5}  {:>10}  {:>16}  {:>7.2}%  {:>7.2}%  {:>6}",
            i + 1,
            r.config.fast_period,
            r.config.slow_period,
            format_percent(r.report.commission_rate),
            format!("${}", format_money(r.report.final_equity)),
            r.metrics.total_return * 100.0,
            r.metrics.max_drawdown * 100.0,
            r.report.trade_count,
        );
    }
    println!();
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let report = &result.report;
    let metrics = &result.metrics;
    println!("Final Portfolio Value:   ${}", format_money(report.final_equity));
    println!("Commission:              {}", format_percent(report.commission_rate));
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", result.symbol);
    println!("Period:         {} to {}", result.start_date, result.end_date);
    println!(
        "Parameters:     fast {} / slow {} ({})",
        result.config.fast_period,
        result.config.slow_period,
        report.fill_timing.name()
    );
    println!("Bars:           {}", result.bar_count);
    println!(
        "Fills:          {} ({} round trips, {} skipped)",
        report.trade_count, metrics.trade_count, report.skipped_trades
    );
    println!("Net Profit:     ${}", format_money(report.net_profit()));
    println!("Commission Paid: ${}", format_money(report.total_commission));
    if let Some(position) = &report.final_position {
        println!(
            "Open Position:  {} @ {}",
            position.quantity, position.avg_entry_price
        );
    }
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", metrics.total_return * 100.0);
    println!("CAGR:           {:.2}%", metrics.cagr * 100.0);
    println!("Sharpe:         {:.3}", metrics.sharpe);
    println!("Sortino:        {:.3}", metrics.sortino);
    println!(
        "Max Drawdown:   {:.2}% ({} bars)",
        metrics.max_drawdown * 100.0,
        metrics.max_drawdown_duration
    );
    println!("Win Rate:       {:.1}%", metrics.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", metrics.profit_factor);
    println!("Exposure:       {:.1}%", metrics.exposure * 100.0);
    println!("Run ID:         {}", result.run_id);
    println!();
}

/// `1234567.891` → `1,234,567.89`
fn format_money(value: Decimal) -> String {
    let rounded = format!("{:.2}", value.round_dp(2));
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac_part}")
}

/// `0.01` → `1%`, `0.0005` → `0.05%`
fn format_percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}
