//! Artifact export — JSON result plus CSV equity curve and trade tape.
//!
//! A run's artifacts live under `<output_dir>/<run id prefix>/`:
//! - `result.json` — the full `BacktestResult`, schema-versioned
//! - `equity.csv` — one row per bar
//! - `trades.csv` — one row per closed round trip
//!
//! Decimal values are written with their exact textual form.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use crossover_core::{EquityPoint, TradeRecord};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

/// Hex characters of the run id used for the artifact directory name.
pub const RUN_DIR_PREFIX_LEN: usize = 12;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: bar_index, timestamp, equity
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "timestamp", "equity"])?;
    for (i, point) in equity_curve.iter().enumerate() {
        wtr.write_record([
            i.to_string(),
            point.timestamp.to_string(),
            point.equity.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: entry_bar, entry_time, entry_price, exit_bar, exit_time,
/// exit_price, quantity, gross_pnl, commission, net_pnl, bars_held
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_bar",
        "entry_time",
        "entry_price",
        "exit_bar",
        "exit_time",
        "exit_price",
        "quantity",
        "gross_pnl",
        "commission",
        "net_pnl",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            t.entry_bar.to_string(),
            t.entry_time.to_string(),
            t.entry_price.to_string(),
            t.exit_bar.to_string(),
            t.exit_time.to_string(),
            t.exit_price.to_string(),
            t.quantity.to_string(),
            t.gross_pnl.to_string(),
            t.commission.to_string(),
            t.net_pnl.to_string(),
            t.bars_held.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory a run's artifacts are written to under `output_dir`.
pub fn run_dir(result: &BacktestResult, output_dir: &Path) -> PathBuf {
    let prefix_len = RUN_DIR_PREFIX_LEN.min(result.run_id.len());
    output_dir.join(&result.run_id[..prefix_len])
}

/// Save the full artifact set for a single backtest run.
///
/// Re-running the same parameters overwrites the same directory. Returns the
/// path to the directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dir = run_dir(result, output_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create artifact dir: {}", dir.display()))?;

    let json = export_json(result)?;
    write(&dir.join("result.json"), &json)?;
    write(&dir.join("equity.csv"), &export_equity_csv(&result.report.equity_curve)?)?;
    write(&dir.join("trades.csv"), &export_trades_csv(&result.report.trades)?)?;

    info!(dir = %dir.display(), "saved artifacts");
    Ok(dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
