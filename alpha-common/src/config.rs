//! Configuration management for the alpha research workspace.
//!
//! The research pipeline reads a single configuration file at
//! `~/.alpha-research/config.json`. Every field has a default, so a missing
//! file yields a runnable configuration.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (ALPHA_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `ALPHA_LOG_LEVEL` → observability.log_level
//! - `ALPHA_LOG_FORMAT` → observability.log_format
//! - `ALPHA_CACHE_DIR` → data.cache_dir
//! - `ALPHA_SYMBOLS` → data.symbols (comma separated)
//! - `ALPHA_SEED` → data.seed

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".alpha-research"),
        |dirs| dirs.home_dir().join(".alpha-research"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for the research pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Universe, history window and cache location
    #[serde(default)]
    pub data: DataConfig,

    /// Factor and backtest parameters
    #[serde(default)]
    pub research: ResearchConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::parse(path, e))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("ALPHA_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("ALPHA_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(dir) = lookup("ALPHA_CACHE_DIR") {
            self.data.cache_dir = Some(dir);
        }
        if let Some(symbols) = lookup("ALPHA_SYMBOLS") {
            let parsed: Vec<String> = symbols
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !parsed.is_empty() {
                self.data.symbols = parsed;
            }
        }
        if let Some(seed) = lookup("ALPHA_SEED") {
            match seed.parse() {
                Ok(s) => self.data.seed = s,
                Err(_) => tracing::warn!(value = %seed, "Ignoring unparsable ALPHA_SEED"),
            }
        }
    }

    /// Resolved cache directory (configured or `<config_dir>/cache`).
    pub fn cache_dir(&self) -> PathBuf {
        self.data
            .cache_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir().join("cache"))
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to clamp to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Data
// ============================================================================

/// Universe and price history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Symbols in the research universe
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Calendar days of history ending at `end_date`
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    /// Last date of the history window (defaults to today)
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Directory for cached price files
    #[serde(default)]
    pub cache_dir: Option<String>,

    /// Seed for the synthetic price generator
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Minimum fraction of symbols that must have a bar for a date to be kept
    #[serde(default = "default_coverage_threshold")]
    pub coverage_threshold: f64,
}

impl DataConfig {
    /// Resolve the inclusive (start, end) history window.
    pub fn date_window(&self) -> (NaiveDate, NaiveDate) {
        let end = self.end_date.unwrap_or_else(|| Local::now().date_naive());
        let start = end - Duration::days(i64::from(self.history_days));
        (start, end)
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            history_days: default_history_days(),
            end_date: None,
            cache_dir: None,
            seed: default_seed(),
            coverage_threshold: default_coverage_threshold(),
        }
    }
}

// ============================================================================
// Research
// ============================================================================

/// Factor and backtest parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Number of quantile groups per date
    #[serde(default = "default_quantiles")]
    pub quantiles: usize,

    /// Holding horizon in observations for forward returns
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Annualization factor for the Sharpe ratio
    #[serde(default = "default_trading_days")]
    pub trading_days_per_year: f64,

    /// Information coefficient method (spearman, pearson)
    #[serde(default = "default_ic_method")]
    pub ic_method: String,

    /// Long-short direction per factor name (high_minus_low, low_minus_high).
    /// Factors not listed use high_minus_low.
    #[serde(default)]
    pub long_short: HashMap<String, String>,

    /// Lookback windows
    #[serde(default)]
    pub windows: FactorWindowsConfig,

    /// Band width in standard deviations for the volatility breakout factor
    #[serde(default = "default_breakout_band")]
    pub breakout_band: f64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            quantiles: default_quantiles(),
            horizon: default_horizon(),
            trading_days_per_year: default_trading_days(),
            ic_method: default_ic_method(),
            long_short: HashMap::new(),
            windows: FactorWindowsConfig::default(),
            breakout_band: default_breakout_band(),
        }
    }
}

/// Lookback windows for the factor transforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorWindowsConfig {
    #[serde(default = "default_reversal_window")]
    pub price_reversal: usize,

    #[serde(default = "default_volume_price_window")]
    pub volume_price_ratio: usize,

    #[serde(default = "default_breakout_window")]
    pub volatility_breakout: usize,
}

impl Default for FactorWindowsConfig {
    fn default() -> Self {
        Self {
            price_reversal: default_reversal_window(),
            volume_price_ratio: default_volume_price_window(),
            volatility_breakout: default_breakout_window(),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
fn default_symbols() -> Vec<String> {
    [
        "sh600519", "sh601318", "sh600036", "sh600276", "sh601166", "sh600887", "sh601888",
        "sh601398", "sh600030", "sh601288", "sh601628", "sh601857", "sh600028", "sh601988",
        "sh601328", "sh601088", "sh600000", "sh600104", "sh600050", "sh601668",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_history_days() -> u32 {
    365 * 3
}
fn default_seed() -> u64 {
    42
}
fn default_coverage_threshold() -> f64 {
    0.8
}
fn default_quantiles() -> usize {
    3
}
fn default_horizon() -> usize {
    1
}
fn default_trading_days() -> f64 {
    252.0
}
fn default_ic_method() -> String {
    "spearman".into()
}
fn default_breakout_band() -> f64 {
    2.0
}
fn default_reversal_window() -> usize {
    5
}
fn default_volume_price_window() -> usize {
    10
}
fn default_breakout_window() -> usize {
    20
}
