//! Deterministic fingerprints for configs, datasets and results.
//!
//! All hashes are BLAKE3 over a canonical byte encoding and rendered as hex.
//! Two runs over the same series and config produce the same curve hash.

use crate::config::BacktestConfig;
use crate::domain::{BarSeries, EquityPoint};

/// Hash of a config's canonical JSON form.
pub fn config_hash(config: &BacktestConfig) -> String {
    let json = serde_json::to_string(config).expect("BacktestConfig must serialize");
    blake3::hash(json.as_bytes()).to_hex().to_string()
}

/// Hash over every bar's timestamp and OHLCV values.
pub fn dataset_hash(series: &BarSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in series {
        hasher.update(bar.timestamp.to_string().as_bytes());
        for price in [bar.open, bar.high, bar.low, bar.close] {
            hasher.update(&price.normalize().serialize());
        }
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Hash over an equity curve. Equal curves give equal hashes regardless of
/// decimal scale (`10.0` and `10.00` hash the same).
pub fn curve_hash(curve: &[EquityPoint]) -> String {
    let mut hasher = blake3::Hasher::new();
    for point in curve {
        hasher.update(point.timestamp.to_string().as_bytes());
        hasher.update(&point.equity.normalize().serialize());
    }
    hasher.finalize().to_hex().to_string()
}
