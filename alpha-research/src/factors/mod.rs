//! Alpha factor engine.
//!
//! Three independent per-symbol transforms over daily history:
//!
//! - **Price Reversal**: negated return over the last `window` observations
//! - **Volume-Price Ratio**: moving average of volume change over price change
//! - **Volatility Breakout**: +1 / -1 / 0 for a close outside the trailing
//!   mean ± band·std envelope
//!
//! Each cell is tri-state so "not enough history" and "zero denominator" stay
//! distinguishable from a computed zero.

mod breakout;
mod reversal;
mod rolling;
mod volume_price;

pub use breakout::volatility_breakout;
pub use reversal::price_reversal;
pub use volume_price::volume_price_ratio;

use alpha_common::ResearchConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::data::{PricePanel, SymbolSeries};

// ============================================================================
// Factor Cell
// ============================================================================

/// One factor observation for a (date, symbol).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum FactorCell {
    /// Computed value
    Value(f64),
    /// Lookback window not yet filled
    InsufficientHistory,
    /// A denominator in the transform was zero
    DivisionByZero,
}

impl FactorCell {
    /// `num / den`, or `DivisionByZero` when `den == 0`.
    pub fn ratio(num: f64, den: f64) -> Self {
        if den == 0.0 {
            Self::DivisionByZero
        } else {
            Self::Value(num / den)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// The value, or NaN when undefined.
    pub fn as_f64(&self) -> f64 {
        self.value().unwrap_or(f64::NAN)
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Value(v) => Self::Value(f(v)),
            other => other,
        }
    }
}

// ============================================================================
// Factor Kind
// ============================================================================

/// The factors computed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    PriceReversal,
    VolumePriceRatio,
    VolatilityBreakout,
}

impl FactorKind {
    pub const ALL: [FactorKind; 3] = [
        FactorKind::PriceReversal,
        FactorKind::VolumePriceRatio,
        FactorKind::VolatilityBreakout,
    ];

    /// Stable snake_case name used in config and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PriceReversal => "price_reversal",
            Self::VolumePriceRatio => "volume_price_ratio",
            Self::VolatilityBreakout => "volatility_breakout",
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FactorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown factor: {}", s))
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Lookback windows and band width for the transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorParams {
    pub reversal_window: usize,
    pub volume_price_window: usize,
    pub breakout_window: usize,
    pub breakout_band: f64,
}

impl Default for FactorParams {
    fn default() -> Self {
        Self {
            reversal_window: 5,
            volume_price_window: 10,
            breakout_window: 20,
            breakout_band: 2.0,
        }
    }
}

impl FactorParams {
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self {
            reversal_window: config.windows.price_reversal,
            volume_price_window: config.windows.volume_price_ratio,
            breakout_window: config.windows.volatility_breakout,
            breakout_band: config.breakout_band,
        }
    }

    /// Number of leading observations that are always undefined.
    pub fn lookback(&self, kind: FactorKind) -> usize {
        match kind {
            FactorKind::PriceReversal => self.reversal_window,
            FactorKind::VolumePriceRatio => self.volume_price_window,
            FactorKind::VolatilityBreakout => self.breakout_window,
        }
    }
}

// ============================================================================
// Factor Series / Frame
// ============================================================================

/// Factor cells for one symbol, aligned with its bar dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSeries {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub cells: Vec<FactorCell>,
}

impl FactorSeries {
    /// Cell on `date`, if the symbol traded that day.
    pub fn get(&self, date: NaiveDate) -> Option<FactorCell> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.cells[idx])
    }

    /// Iterate defined (date, value) pairs.
    pub fn defined(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates
            .iter()
            .zip(&self.cells)
            .filter_map(|(d, c)| c.value().map(|v| (*d, v)))
    }
}

/// One factor across the whole panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorFrame {
    pub kind: FactorKind,
    pub series: Vec<FactorSeries>,
}

impl FactorFrame {
    /// Number of defined cells across all symbols.
    pub fn defined_count(&self) -> usize {
        self.series.iter().map(|s| s.defined().count()).sum()
    }

    /// Defined values keyed by (date, symbol).
    pub fn values_by_key(&self) -> HashMap<(NaiveDate, &str), f64> {
        self.series
            .iter()
            .flat_map(|s| s.defined().map(move |(d, v)| ((d, s.symbol.as_str()), v)))
            .collect()
    }
}

/// Compute one factor for one symbol.
pub fn compute_series(kind: FactorKind, params: &FactorParams, series: &SymbolSeries) -> FactorSeries {
    let closes = series.closes();
    let cells = match kind {
        FactorKind::PriceReversal => price_reversal(&closes, params.reversal_window),
        FactorKind::VolumePriceRatio => {
            volume_price_ratio(&closes, &series.volumes(), params.volume_price_window)
        }
        FactorKind::VolatilityBreakout => {
            volatility_breakout(&closes, params.breakout_window, params.breakout_band)
        }
    };

    FactorSeries {
        symbol: series.symbol.clone(),
        dates: series.dates(),
        cells,
    }
}

/// Compute one factor for every symbol in the panel.
pub fn compute_factor(kind: FactorKind, params: &FactorParams, panel: &PricePanel) -> FactorFrame {
    let series: Vec<FactorSeries> = panel
        .series()
        .iter()
        .map(|s| compute_series(kind, params, s))
        .collect();

    let frame = FactorFrame { kind, series };
    tracing::debug!(
        factor = %kind,
        symbols = frame.series.len(),
        defined = frame.defined_count(),
        "Factor computed"
    );
    frame
}

/// Compute every factor, in [`FactorKind::ALL`] order.
pub fn compute_all(params: &FactorParams, panel: &PricePanel) -> Vec<FactorFrame> {
    FactorKind::ALL
        .into_iter()
        .map(|kind| compute_factor(kind, params, panel))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
