//! CSV bar loading.
//!
//! Expects a header row naming `Date, Open, High, Low, Close, Volume` in any
//! order and any case. Extra columns (`Adj Close`, ...) are ignored. Dates are
//! `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
//!
//! Every field is parsed exactly into a `Decimal`; nothing goes through `f64`.
//! Ordering and OHLC sanity are checked by `BarSeries::new`, so a loaded series
//! is always safe to hand to the simulator.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crossover_core::{BacktestError, Bar, BarSeries};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: missing value for column '{column}'")]
    MissingField { line: u64, column: &'static str },

    #[error("line {line}: cannot parse {column} from '{value}'")]
    InvalidField {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("invalid bar series: {0}")]
    Series(#[from] BacktestError),
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &'static str, aliases: &[&str]| {
            headers
                .iter()
                .position(|h| {
                    let h = h.trim().to_ascii_lowercase();
                    aliases.contains(&h.as_str())
                })
                .ok_or(LoadError::MissingColumn(name))
        };
        Ok(Self {
            date: find("date", &["date", "datetime", "timestamp", "time"])?,
            open: find("open", &["open", "o"])?,
            high: find("high", &["high", "h"])?,
            low: find("low", &["low", "l"])?,
            close: find("close", &["close", "c"])?,
            volume: find("volume", &["volume", "vol", "v"])?,
        })
    }
}

/// Load a bar series from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<BarSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = load_bars_from_reader(file)?;
    info!(
        path = %path.display(),
        bars = series.len(),
        first = ?series.first().map(|b| b.timestamp),
        last = ?series.last().map(|b| b.timestamp),
        "loaded bars"
    );
    Ok(series)
}

/// Load a bar series from any CSV source with a header row.
pub fn load_bars_from_reader<R: Read>(reader: R) -> Result<BarSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::resolve(rdr.headers()?)?;

    let mut bars = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        bars.push(parse_bar(&record, columns, line)?);
    }

    Ok(BarSeries::new(bars)?)
}

fn parse_bar(record: &csv::StringRecord, columns: Columns, line: u64) -> Result<Bar, LoadError> {
    let field = |index: usize, column: &'static str| match record.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(LoadError::MissingField { line, column }),
    };
    let price = |index: usize, column: &'static str| {
        let value = field(index, column)?;
        Decimal::from_str(value).map_err(|_| LoadError::InvalidField {
            line,
            column,
            value: value.to_string(),
        })
    };

    let date = field(columns.date, "date")?;
    let timestamp = parse_timestamp(date).ok_or_else(|| LoadError::InvalidField {
        line,
        column: "date",
        value: date.to_string(),
    })?;
    let volume = field(columns.volume, "volume")?;

    Ok(Bar {
        timestamp,
        open: price(columns.open, "open")?,
        high: price(columns.high, "high")?,
        low: price(columns.low, "low")?,
        close: price(columns.close, "close")?,
        volume: parse_volume(volume).ok_or_else(|| LoadError::InvalidField {
            line,
            column: "volume",
            value: volume.to_string(),
        })?,
    })
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Whole non-negative counts; `1500.0` is accepted, `1500.5` is not.
fn parse_volume(value: &str) -> Option<u64> {
    if let Ok(v) = value.parse::<u64>() {
        return Some(v);
    }
    let d = Decimal::from_str(value).ok()?;
    if d.fract().is_zero() {
        d.to_u64()
    } else {
        None
    }
}
