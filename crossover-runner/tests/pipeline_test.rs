//! End-to-end pipeline: CSV on disk → TOML config → run → artifacts → reload.

use std::path::Path;

use rust_decimal_macros::dec;
use fixture::*;

use crossover_runner::export::{export_json, import_json, run_dir};
use crossover_runner::{
    load_artifacts, load_bars_csv, run_backtest, run_from_config, save_artifacts, ParamGrid,
    ParamSweep, RankBy, RunConfig, RunError,
};

mod fixture {
    use std::path::{Path, PathBuf};

    /// Three bars: fast(1) crosses above slow(2) on bar 1, fill at bar 2's open.
    pub const COMMISSION_CSV: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-02,90,91,89,90,90,1000
2024-01-03,90,101,89,100,100,1000
2024-01-04,100,101,99,100,100,1000
";

    pub fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// A rise, a fall and a second rise, 180 daily bars.
    pub fn wave_csv() -> String {
        let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
        let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let mut prev = 100i64;
        for i in 0..180i64 {
            let phase = i % 60;
            let step = if phase < 30 { phase } else { 60 - phase };
            let close = 100 + step * 2 + i / 6;
            let date = start + chrono::Duration::days(i);
            csv.push_str(&format!(
                "{date},{prev},{},{},{close},{}\n",
                prev.max(close) + 1,
                prev.min(close) - 1,
                10_000 + i
            ));
            prev = close;
        }
        csv
    }

    pub fn config_toml(data: &Path, out: &Path, fast: usize, slow: usize, commission: &str) -> String {
        format!(
            r#"[data]
path = "{}"
symbol = "TEST"

[backtest]
fast_period = {fast}
slow_period = {slow}
commission_rate = {commission}
initial_cash = 10000

[output]
dir = "{}"
"#,
            data.display(),
            out.display()
        )
    }
}

fn config(dir: &Path, csv: &str, fast: usize, slow: usize, commission: &str) -> RunConfig {
    let data = write_csv(dir, "bars.csv", csv);
    let out = dir.join("results");
    RunConfig::from_toml_str(&config_toml(&data, &out, fast, slow, commission)).unwrap()
}

#[test]
fn commission_scenario_through_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path(), COMMISSION_CSV, 1, 2, "0.01");
    let result = run_from_config(&cfg).unwrap();

    let report = &result.report;
    assert_eq!(report.fills.len(), 1);
    assert_eq!(report.fills[0].price, dec!(100));
    assert_eq!(report.fills[0].quantity, dec!(99));
    assert_eq!(report.final_cash, dec!(1));
    assert_eq!(report.final_equity, dec!(9901));
    assert_eq!(report.commission_rate, dec!(0.01));
    assert_eq!(result.symbol, "TEST");
    assert_eq!(result.bar_count, 3);
    assert_eq!(result.run_id, cfg.run_id());
}

#[test]
fn artifacts_written_and_reloaded() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path(), &wave_csv(), 5, 20, "0.001");
    let result = run_from_config(&cfg).unwrap();

    let dir = save_artifacts(&result, &cfg.output.dir).unwrap();
    assert_eq!(dir, run_dir(&result, &cfg.output.dir));
    assert!(dir.join("result.json").exists());

    let equity = std::fs::read_to_string(dir.join("equity.csv")).unwrap();
    assert_eq!(equity.lines().count(), 1 + result.bar_count);

    let trades = std::fs::read_to_string(dir.join("trades.csv")).unwrap();
    assert_eq!(trades.lines().count(), 1 + result.report.trades.len());

    let loaded = load_artifacts(&dir).unwrap();
    assert_eq!(loaded.run_id, result.run_id);
    assert_eq!(loaded.config, result.config);
    assert_eq!(loaded.report, result.report);
    assert_eq!(loaded.curve_hash, result.curve_hash);
    assert_eq!(loaded.dataset_hash, result.dataset_hash);
}

#[test]
fn future_schema_version_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path(), COMMISSION_CSV, 1, 2, "0.01");
    let mut result = run_from_config(&cfg).unwrap();
    result.schema_version = crossover_runner::SCHEMA_VERSION + 1;

    let json = export_json(&result).unwrap();
    let err = import_json(&json).unwrap_err();
    assert!(err.to_string().contains("unsupported schema version"));
}

#[test]
fn same_data_same_fingerprints() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path(), &wave_csv(), 5, 20, "0.001");
    let first = run_from_config(&cfg).unwrap();
    let second = run_from_config(&cfg).unwrap();

    assert_eq!(first.dataset_hash, second.dataset_hash);
    assert_eq!(first.curve_hash, second.curve_hash);
    assert_eq!(first.report, second.report);
}

#[test]
fn missing_data_file_is_data_error() {
    let tmp = tempfile::tempdir().unwrap();
    let toml = config_toml(
        &tmp.path().join("absent.csv"),
        &tmp.path().join("results"),
        5,
        20,
        "0.01",
    );
    let cfg = RunConfig::from_toml_str(&toml).unwrap();
    assert!(matches!(run_from_config(&cfg), Err(RunError::Data(_))));
}

#[test]
fn config_file_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let data = write_csv(tmp.path(), "bars.csv", COMMISSION_CSV);
    let toml = config_toml(&data, &tmp.path().join("results"), 1, 2, "0.01");
    let path = write_csv(tmp.path(), "run.toml", &toml);

    let cfg = RunConfig::from_file(&path).unwrap();
    assert_eq!(cfg.data.symbol, "TEST");
    assert!(run_from_config(&cfg).is_ok());
}

#[test]
fn sweep_over_loaded_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_csv(tmp.path(), "bars.csv", &wave_csv());
    let series = load_bars_csv(&path).unwrap();

    let grid = ParamGrid {
        fast_periods: vec![3, 5, 10],
        slow_periods: vec![10, 20],
        commission_rates: vec![dec!(0), dec!(0.01)],
    };
    let base = crossover_core::BacktestConfig::default();
    let results = ParamSweep::new(grid).run(&series, "TEST", &base).unwrap();

    // (3,10) (3,20) (5,10) (5,20) (10,20) × 2 rates
    assert_eq!(results.len(), 10);

    let best = results.best_by(RankBy::FinalEquity).unwrap();
    let single = run_backtest(&series, "TEST", &best.config).unwrap();
    assert_eq!(single.report, best.report);
}
