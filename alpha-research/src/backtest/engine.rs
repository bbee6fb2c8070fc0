//! Quantile backtest engine.
//!
//! For every date the engine ranks the symbols with a defined factor value,
//! splits them into equal-count groups, and measures each group's mean
//! forward return. The spread between the extreme groups forms the
//! long-short series; the cross-sectional rank correlation between factor
//! and forward return forms the IC series.

use alpha_common::ResearchConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::metrics::{cumulative_returns, FactorPerformance};
use super::quantile::assign_quantiles;
use crate::data::PricePanel;
use crate::factors::{FactorFrame, FactorKind};
use crate::stats;

// ============================================================================
// Parameters
// ============================================================================

/// Unrecognised enum name in configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Correlation used for the information coefficient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IcMethod {
    /// Rank correlation
    #[default]
    Spearman,
    /// Linear correlation
    Pearson,
}

impl IcMethod {
    pub fn correlate(&self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            Self::Spearman => stats::spearman(x, y),
            Self::Pearson => stats::pearson(x, y),
        }
    }
}

impl FromStr for IcMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spearman" => Ok(Self::Spearman),
            "pearson" => Ok(Self::Pearson),
            _ => Err(ParseEnumError {
                kind: "ic method",
                value: s.to_string(),
            }),
        }
    }
}

/// Which extreme group is held long.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongShortDirection {
    /// Long the top group, short the bottom group (Qn - Q1)
    #[default]
    HighMinusLow,
    /// Long the bottom group, short the top group (Q1 - Qn)
    LowMinusHigh,
}

impl LongShortDirection {
    /// Configured direction for `kind`, defaulting to high-minus-low.
    ///
    /// Keys match the factor name ignoring ASCII case, like the values.
    pub fn for_factor(config: &ResearchConfig, kind: FactorKind) -> Result<Self, ParseEnumError> {
        config
            .long_short
            .get(kind.name())
            .or_else(|| {
                config
                    .long_short
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(kind.name()))
                    .map(|(_, value)| value)
            })
            .map_or(Ok(Self::default()), |s| s.parse())
    }

    /// Spread between the bottom and top group returns.
    pub fn spread(&self, low: f64, high: f64) -> f64 {
        match self {
            Self::HighMinusLow => high - low,
            Self::LowMinusHigh => low - high,
        }
    }
}

impl fmt::Display for LongShortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighMinusLow => f.write_str("high_minus_low"),
            Self::LowMinusHigh => f.write_str("low_minus_high"),
        }
    }
}

impl FromStr for LongShortDirection {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high_minus_low" => Ok(Self::HighMinusLow),
            "low_minus_high" => Ok(Self::LowMinusHigh),
            _ => Err(ParseEnumError {
                kind: "long-short direction",
                value: s.to_string(),
            }),
        }
    }
}

/// Backtest configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Number of quantile groups
    pub quantiles: usize,
    /// Holding horizon in observations
    pub horizon: usize,
    /// Annualization factor for the Sharpe ratio
    pub trading_days_per_year: f64,
    /// IC correlation method
    pub ic_method: IcMethod,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            quantiles: 3,
            horizon: 1,
            trading_days_per_year: 252.0,
            ic_method: IcMethod::Spearman,
        }
    }
}

impl BacktestConfig {
    pub fn from_research(config: &ResearchConfig) -> Result<Self, ParseEnumError> {
        Ok(Self {
            quantiles: config.quantiles,
            horizon: config.horizon,
            trading_days_per_year: config.trading_days_per_year,
            ic_method: config.ic_method.parse()?,
        })
    }
}

// ============================================================================
// Results
// ============================================================================

/// Mean forward return of each group on one date; index 0 is Q1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileReturns {
    pub date: NaiveDate,
    pub returns: Vec<Option<f64>>,
}

/// Backtest result
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    /// Factor tested
    pub factor: FactorKind,
    /// Long-short direction used
    pub direction: LongShortDirection,
    /// Per-date group returns
    pub quantile_returns: Vec<QuantileReturns>,
    /// Daily long-short returns
    pub long_short: Vec<(NaiveDate, f64)>,
    /// Daily information coefficient
    pub ic_series: Vec<(NaiveDate, f64)>,
    /// Compounded long-short wealth curve
    pub cumulative: Vec<(NaiveDate, f64)>,
    /// Summary statistics
    pub performance: FactorPerformance,
    /// Dates with fewer ranked symbols than groups
    pub skipped_dates: Vec<NaiveDate>,
}

impl BacktestResult {
    /// Compounded wealth curve of one group (0-based), over the dates on
    /// which that group has a return.
    pub fn quantile_cumulative(&self, group: usize) -> Vec<(NaiveDate, f64)> {
        let (dates, returns): (Vec<NaiveDate>, Vec<f64>) = self
            .quantile_returns
            .iter()
            .filter_map(|row| row.returns.get(group).copied().flatten().map(|r| (row.date, r)))
            .unzip();
        dates.into_iter().zip(cumulative_returns(&returns)).collect()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Backtest engine
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// `close(t + horizon) / close(t) - 1` per (date, symbol), on each
    /// symbol's own series.
    pub fn forward_returns<'a>(&self, panel: &'a PricePanel) -> HashMap<(NaiveDate, &'a str), f64> {
        let h = self.config.horizon;
        let mut out = HashMap::new();
        for series in panel.series() {
            for (i, bar) in series.bars.iter().enumerate() {
                let Some(exit) = series.bars.get(i + h) else {
                    break;
                };
                if h > 0 && bar.close != 0.0 {
                    out.insert((bar.date, series.symbol.as_str()), exit.close / bar.close - 1.0);
                }
            }
        }
        out
    }

    /// Run the quantile backtest of one factor over the panel.
    pub fn run(
        &self,
        panel: &PricePanel,
        frame: &FactorFrame,
        direction: LongShortDirection,
    ) -> BacktestResult {
        let groups = self.config.quantiles;
        let forward = self.forward_returns(panel);

        let mut quantile_returns = Vec::new();
        let mut long_short = Vec::new();
        let mut ic_series = Vec::new();
        let mut skipped_dates = Vec::new();

        for date in panel.dates() {
            // Panel order, so equal values rank by position.
            let ranked: Vec<(&str, f64)> = frame
                .series
                .iter()
                .filter_map(|s| {
                    s.get(date)
                        .and_then(|cell| cell.value())
                        .map(|v| (s.symbol.as_str(), v))
                })
                .collect();

            let values: Vec<f64> = ranked.iter().map(|(_, v)| *v).collect();
            let Some(assigned) = assign_quantiles(&values, groups) else {
                if !ranked.is_empty() {
                    tracing::trace!(%date, ranked = ranked.len(), groups, "Skipping date");
                    skipped_dates.push(date);
                }
                continue;
            };

            let mut sums = vec![(0.0, 0usize); groups];
            let mut ic_factor = Vec::with_capacity(ranked.len());
            let mut ic_return = Vec::with_capacity(ranked.len());
            for ((symbol, value), group) in ranked.iter().zip(&assigned) {
                if let Some(r) = forward.get(&(date, *symbol)) {
                    sums[*group].0 += r;
                    sums[*group].1 += 1;
                    ic_factor.push(*value);
                    ic_return.push(*r);
                }
            }

            let returns: Vec<Option<f64>> = sums
                .iter()
                .map(|(sum, n)| (*n > 0).then(|| sum / *n as f64))
                .collect();
            if returns.iter().all(Option::is_none) {
                // Horizon runs past the end of the data.
                continue;
            }

            if let (Some(low), Some(high)) = (returns[0], returns[groups - 1]) {
                long_short.push((date, direction.spread(low, high)));
            }

            let ic = self.config.ic_method.correlate(&ic_factor, &ic_return);
            if ic.is_finite() {
                ic_series.push((date, ic));
            }

            quantile_returns.push(QuantileReturns { date, returns });
        }

        let ls_values: Vec<f64> = long_short.iter().map(|(_, r)| *r).collect();
        let ic_values: Vec<f64> = ic_series.iter().map(|(_, ic)| *ic).collect();
        let performance = FactorPerformance::from_series(
            &ls_values,
            &ic_values,
            self.config.trading_days_per_year,
        );
        let cumulative = long_short
            .iter()
            .map(|(d, _)| *d)
            .zip(cumulative_returns(&ls_values))
            .collect();

        tracing::debug!(
            factor = %frame.kind,
            %direction,
            observations = performance.observations,
            skipped = skipped_dates.len(),
            sharpe = performance.sharpe_ratio,
            mean_ic = performance.mean_ic,
            "Backtest completed"
        );

        BacktestResult {
            factor: frame.kind,
            direction,
            quantile_returns,
            long_short,
            ic_series,
            cumulative,
            performance,
            skipped_dates,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
