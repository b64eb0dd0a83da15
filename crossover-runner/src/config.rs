//! TOML run configuration.
//!
//! ```toml
//! [data]
//! path = "data/SPY.csv"
//! symbol = "SPY"
//!
//! [backtest]
//! fast_period = 50
//! slow_period = 200
//! commission_rate = 0.01
//! initial_cash = 10000
//! fill_timing = "next_bar_open"
//!
//! [output]
//! dir = "results"
//! ```
//!
//! `[backtest]` and `[output]` may be omitted or partial; missing keys take
//! their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crossover_core::fingerprint::config_hash;
use crossover_core::{BacktestConfig, ConfigError};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from reading or validating a run configuration file.
#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid backtest parameters: {0}")]
    Invalid(#[from] ConfigError),
}

/// Where the bars come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSection {
    pub path: PathBuf,
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

/// Where artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_symbol() -> String {
    "UNKNOWN".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

/// Everything needed to reproduce one backtest from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataSection,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub output: OutputSection,
}

impl RunConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RunConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, RunConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.backtest.validate()?;
        Ok(config)
    }

    /// Deterministic hash of the symbol and backtest parameters.
    ///
    /// The data path and output directory are not part of the id: the same
    /// parameters over the same symbol share a run id wherever the files live.
    pub fn run_id(&self) -> RunId {
        run_id(&self.data.symbol, &self.backtest)
    }
}

/// Run id for a symbol and parameter set: BLAKE3 over the symbol and the
/// config fingerprint.
pub fn run_id(symbol: &str, config: &BacktestConfig) -> RunId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(&[0]);
    hasher.update(config_hash(config).as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossover_core::FillTiming;
    use rust_decimal_macros::dec;

    const FULL: &str = r#"
[data]
path = "data/SPY.csv"
symbol = "SPY"

[backtest]
fast_period = 20
slow_period = 100
commission_rate = 0.001
initial_cash = 25000
fill_timing = "same_bar_close"

[output]
dir = "out"
"#;

    #[test]
    fn parses_full_config() {
        let config = RunConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.data.path, PathBuf::from("data/SPY.csv"));
        assert_eq!(config.data.symbol, "SPY");
        assert_eq!(config.backtest.fast_period, 20);
        assert_eq!(config.backtest.slow_period, 100);
        assert_eq!(config.backtest.commission_rate, dec!(0.001));
        assert_eq!(config.backtest.initial_cash, dec!(25000));
        assert_eq!(config.backtest.fill_timing, FillTiming::SameBarClose);
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }

    #[test]
    fn missing_sections_take_defaults() {
        let config = RunConfig::from_toml_str("[data]\npath = \"bars.csv\"\n").unwrap();
        assert_eq!(config.backtest, BacktestConfig::default());
        assert_eq!(config.output.dir, PathBuf::from("results"));
        assert_eq!(config.data.symbol, "UNKNOWN");
    }

    #[test]
    fn partial_backtest_section_fills_defaults() {
        let toml = "[data]\npath = \"bars.csv\"\n\n[backtest]\nfast_period = 10\n";
        let config = RunConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.backtest.fast_period, 10);
        assert_eq!(config.backtest.slow_period, 200);
        assert_eq!(config.backtest.commission_rate, dec!(0.01));
    }

    #[test]
    fn invalid_parameters_rejected() {
        let toml = "[data]\npath = \"bars.csv\"\n\n[backtest]\nfast_period = 200\nslow_period = 50\n";
        let err = RunConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(
            err,
            RunConfigError::Invalid(ConfigError::SlowNotAboveFast { fast: 200, slow: 50 })
        ));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = RunConfig::from_toml_str("[data\npath = ").unwrap_err();
        assert!(matches!(err, RunConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RunConfig::from_file(Path::new("/nonexistent/run.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/run.toml"));
    }

    #[test]
    fn run_id_is_deterministic() {
        let config = RunConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.run_id(), config.run_id());
        assert_eq!(config.run_id().len(), 64);
    }

    #[test]
    fn run_id_changes_with_params() {
        let config1 = RunConfig::from_toml_str(FULL).unwrap();
        let mut config2 = config1.clone();
        config2.backtest.fast_period = 30;
        assert_ne!(config1.run_id(), config2.run_id());

        let mut config3 = config1.clone();
        config3.data.symbol = "QQQ".into();
        assert_ne!(config1.run_id(), config3.run_id());
    }

    #[test]
    fn run_id_follows_config_fingerprint() {
        let config = RunConfig::from_toml_str(FULL).unwrap();
        let mut other = config.clone();
        other.backtest.commission_rate = dec!(0.002);
        assert_ne!(config_hash(&config.backtest), config_hash(&other.backtest));
        assert_ne!(config.run_id(), other.run_id());
        assert_eq!(run_id("SPY", &config.backtest), run_id("SPY", &config.backtest.clone()));
    }

    #[test]
    fn run_id_ignores_paths() {
        let config1 = RunConfig::from_toml_str(FULL).unwrap();
        let mut config2 = config1.clone();
        config2.data.path = PathBuf::from("elsewhere/SPY.csv");
        config2.output.dir = PathBuf::from("elsewhere");
        assert_eq!(config1.run_id(), config2.run_id());
    }
}
