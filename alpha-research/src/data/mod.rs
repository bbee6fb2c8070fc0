//! Market data module for the research pipeline.
//!
//! Provides the daily price panel, the provider abstraction, the read-through
//! cache stores and the loader that ties them together.
//!
//! # Data Sources
//! - **Synthetic**: seeded random-walk generator over business days
//! - Any other source plugs in through [`DataProvider`]

mod cache;
mod loader;
mod provider;
mod synthetic;

pub use cache::{CacheError, CacheLookup, CacheStore, CsvCacheStore, MemoryCacheStore};
pub use loader::{LoaderError, PanelLoader};
pub use provider::{DataProvider, ProviderError};
pub use synthetic::SyntheticProvider;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

// ============================================================================
// Core Data Types
// ============================================================================

/// A single daily bar (OHLCV)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Trading date
    pub date: NaiveDate,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: f64,
}

/// Inclusive date window for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PanelError> {
        if start > end {
            return Err(PanelError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Check if a date falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.start, self.end)
    }
}

/// Errors raised when a panel breaks its ordering invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("{symbol}: date {date} is not after the previous bar")]
    UnorderedDates { symbol: String, date: NaiveDate },

    #[error("symbol {0} appears more than once in the panel")]
    DuplicateSymbol(String),

    #[error("invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Daily history for one symbol, ordered by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl SymbolSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    /// Check that dates are strictly increasing.
    pub fn validate(&self) -> Result<(), PanelError> {
        for pair in self.bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(PanelError::UnorderedDates {
                    symbol: self.symbol.clone(),
                    date: pair[1].date,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Keep only the bars inside `range`.
    pub fn within(mut self, range: DateRange) -> Self {
        self.bars.retain(|b| range.contains(b.date));
        self
    }
}

/// Daily OHLCV history for a universe of symbols.
///
/// Symbols keep the order they were inserted in; that order is the stable
/// tie-break used by cross-sectional ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricePanel {
    series: Vec<SymbolSeries>,
}

impl PricePanel {
    /// Build a panel, validating per-symbol ordering and symbol uniqueness.
    pub fn new(series: Vec<SymbolSeries>) -> Result<Self, PanelError> {
        let mut seen = HashSet::new();
        for s in &series {
            if !seen.insert(s.symbol.as_str()) {
                return Err(PanelError::DuplicateSymbol(s.symbol.clone()));
            }
            s.validate()?;
        }
        Ok(Self { series })
    }

    pub fn series(&self) -> &[SymbolSeries] {
        &self.series
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolSeries> {
        self.series.iter().find(|s| s.symbol == symbol)
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Sorted union of all trading dates in the panel.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.coverage().into_keys().collect()
    }

    /// Number of symbols with a bar on each date.
    fn coverage(&self) -> BTreeMap<NaiveDate, usize> {
        let mut counts = BTreeMap::new();
        for s in &self.series {
            for bar in &s.bars {
                *counts.entry(bar.date).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Drop dates on which fewer than `threshold` of the symbols have a bar.
    pub fn filter_by_coverage(&self, threshold: f64) -> Self {
        let required = threshold * self.series.len() as f64;
        let kept: HashSet<NaiveDate> = self
            .coverage()
            .into_iter()
            .filter(|(_, count)| *count as f64 >= required)
            .map(|(date, _)| date)
            .collect();

        let series = self
            .series
            .iter()
            .map(|s| SymbolSeries {
                symbol: s.symbol.clone(),
                bars: s.bars.iter().filter(|b| kept.contains(&b.date)).copied().collect(),
            })
            .collect();

        Self { series }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i64::from(n))
    }

    pub(crate) fn bar(n: u32, close: f64, volume: f64) -> Bar {
        Bar {
            date: day(n),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    pub(crate) fn series_from_closes(symbol: &str, closes: &[f64]) -> SymbolSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| bar(i as u32, *c, 1000.0))
            .collect();
        SymbolSeries::new(symbol, bars)
    }

    #[test]
    fn test_panel_rejects_unordered_dates() {
        let s = SymbolSeries::new("AAA", vec![bar(1, 10.0, 1.0), bar(1, 11.0, 1.0)]);
        assert_eq!(
            PricePanel::new(vec![s]),
            Err(PanelError::UnorderedDates {
                symbol: "AAA".into(),
                date: day(1)
            })
        );
    }

    #[test]
    fn test_panel_rejects_duplicate_symbol() {
        let a = series_from_closes("AAA", &[1.0, 2.0]);
        let result = PricePanel::new(vec![a.clone(), a]);
        assert_eq!(result, Err(PanelError::DuplicateSymbol("AAA".into())));
    }

    #[test]
    fn test_date_range() {
        assert!(DateRange::new(day(2), day(1)).is_err());
        let range = DateRange::new(day(1), day(3)).unwrap();
        assert!(range.contains(day(1)));
        assert!(range.contains(day(3)));
        assert!(!range.contains(day(4)));
        assert_eq!(range.to_string(), "2024-01-02_2024-01-04");
    }

    #[test]
    fn test_within_clips_range() {
        let s = series_from_closes("AAA", &[1.0, 2.0, 3.0, 4.0]);
        let clipped = s.within(DateRange::new(day(1), day(2)).unwrap());
        assert_eq!(clipped.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_filter_by_coverage() {
        // Day 3 only exists for one of three symbols.
        let a = series_from_closes("AAA", &[1.0, 2.0, 3.0, 4.0]);
        let b = series_from_closes("BBB", &[1.0, 2.0, 3.0]);
        let c = series_from_closes("CCC", &[1.0, 2.0, 3.0]);
        let panel = PricePanel::new(vec![a, b, c]).unwrap();

        assert_eq!(panel.dates().len(), 4);
        let filtered = panel.filter_by_coverage(0.8);
        assert_eq!(filtered.dates(), vec![day(0), day(1), day(2)]);
        assert_eq!(filtered.get("AAA").unwrap().len(), 3);
        assert_eq!(filtered.symbols(), vec!["AAA", "BBB", "CCC"]);
    }
}
