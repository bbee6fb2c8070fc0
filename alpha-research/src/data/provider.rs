//! Data provider abstraction for daily price history.
//!
//! Defines the `DataProvider` trait that every price source implements so the
//! loader can stay agnostic of where bars come from.

use async_trait::async_trait;
use std::fmt;

use super::{DateRange, SymbolSeries};

// ============================================================================
// Provider Error
// ============================================================================

/// Why a provider could not deliver a symbol's history.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// Transport failure talking to the source
    Network(String),
    /// Source is reachable but refusing requests
    Unavailable(String),
    /// Source does not list the symbol
    UnknownSymbol(String),
    /// Source cannot serve the requested window
    RangeNotCovered { symbol: String, range: DateRange },
    /// Bug or unexpected state inside the provider
    Internal(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Unavailable(msg) => write!(f, "Provider unavailable: {}", msg),
            Self::UnknownSymbol(symbol) => write!(f, "Unknown symbol: {}", symbol),
            Self::RangeNotCovered { symbol, range } => {
                write!(f, "No history for {} over {}", symbol, range)
            }
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

// ============================================================================
// Data Provider Trait
// ============================================================================

/// Trait for daily price providers.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Get the provider name (e.g., "synthetic")
    fn name(&self) -> &'static str;

    /// Fetch daily bars for a symbol over an inclusive date range.
    ///
    /// Bars must be ordered by date. Bars outside `range` are tolerated and
    /// clipped by the caller.
    async fn get_daily_bars(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<SymbolSeries, ProviderError>;
}
