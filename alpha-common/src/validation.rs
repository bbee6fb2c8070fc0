//! Configuration validation for the research pipeline.
//!
//! Provides validation logic for configuration fields to ensure
//! all required values are present and within valid ranges.

use thiserror::Error;

use crate::config::{Config, DataConfig, ObservabilityConfig, ResearchConfig};
use crate::error::ResultExt;
use crate::logging::LogFormat;

/// Accepted values for `research.ic_method`.
pub const IC_METHODS: &[&str] = &["spearman", "pearson"];

/// Accepted values for `research.long_short.*`.
pub const LONG_SHORT_DIRECTIONS: &[&str] = &["high_minus_low", "low_minus_high"];

/// Factor names accepted as `research.long_short` keys.
pub const FACTOR_NAMES: &[&str] = &["price_reversal", "volume_price_ratio", "volatility_breakout"];

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }
        if let Err(e) = self.data.validate() {
            errors.push(e);
        }
        if let Err(e) = self.research.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load and validate configuration, applying environment overrides.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load_with_env()?;
        config
            .validate()
            .context(format!("checking {}", crate::config::config_path().display()))?;
        Ok(config)
    }
}

fn one_of(field: &str, value: &str, valid: &[&str]) -> ValidationResult<()> {
    if valid.contains(&value.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.into(),
            reason: format!("must be one of: {}", valid.join(", ")),
        })
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        one_of(
            "observability.log_level",
            &self.log_level,
            &["trace", "debug", "info", "warn", "error"],
        )?;
        self.log_format
            .parse::<LogFormat>()
            .map(|_| ())
            .map_err(|reason| ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason,
            })
    }
}

impl Validate for DataConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.symbols.is_empty() {
            return Err(ValidationError::MissingField {
                field: "data.symbols".into(),
            });
        }

        if self.history_days == 0 {
            return Err(ValidationError::InvalidValue {
                field: "data.history_days".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if !(0.0..=1.0).contains(&self.coverage_threshold) {
            return Err(ValidationError::InvalidValue {
                field: "data.coverage_threshold".into(),
                reason: "must be within [0, 1]".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ResearchConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.quantiles < 2 {
            return Err(ValidationError::InvalidValue {
                field: "research.quantiles".into(),
                reason: "need at least 2 groups to form a long-short spread".into(),
            });
        }

        if self.horizon == 0 {
            return Err(ValidationError::InvalidValue {
                field: "research.horizon".into(),
                reason: "must be at least 1 observation".into(),
            });
        }

        if self.trading_days_per_year <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "research.trading_days_per_year".into(),
                reason: "must be positive".into(),
            });
        }

        one_of("research.ic_method", &self.ic_method, IC_METHODS)?;

        let mut seen: Vec<String> = Vec::with_capacity(self.long_short.len());
        for (factor, direction) in &self.long_short {
            let field = format!("research.long_short.{}", factor);
            one_of(&field, factor, FACTOR_NAMES)?;
            one_of(&field, direction, LONG_SHORT_DIRECTIONS)?;

            // Keys are matched ignoring case, so two spellings of one factor conflict.
            let key = factor.to_lowercase();
            if seen.contains(&key) {
                return Err(ValidationError::InvalidValue {
                    field,
                    reason: format!("direction for {} given more than once", key),
                });
            }
            seen.push(key);
        }

        let windows = &self.windows;
        for (field, window) in [
            ("research.windows.price_reversal", windows.price_reversal),
            ("research.windows.volume_price_ratio", windows.volume_price_ratio),
            ("research.windows.volatility_breakout", windows.volatility_breakout),
        ] {
            if window == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    reason: "must be greater than 0".into(),
                });
            }
        }

        // Sample standard deviation needs two observations.
        if windows.volatility_breakout < 2 {
            return Err(ValidationError::InvalidValue {
                field: "research.windows.volatility_breakout".into(),
                reason: "must be at least 2".into(),
            });
        }

        if self.breakout_band <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "research.breakout_band".into(),
                reason: "must be positive".into(),
            });
        }

        Ok(())
    }
}
