//! Panel loader: read-through cache in front of a data provider.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::cache::{CacheLookup, CacheStore};
use super::provider::{DataProvider, ProviderError};
use super::{DateRange, PanelError, PricePanel, SymbolSeries};

/// Errors that abort a panel load.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to retrieve {symbol} from {provider}: {source}")]
    Retrieval {
        symbol: String,
        provider: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Panel(#[from] PanelError),
}

/// Loads price panels, serving from the cache store when possible.
pub struct PanelLoader {
    provider: Arc<dyn DataProvider>,
    cache: Arc<dyn CacheStore>,
}

impl PanelLoader {
    pub fn new(provider: Arc<dyn DataProvider>, cache: Arc<dyn CacheStore>) -> Self {
        Self { provider, cache }
    }

    /// Load one symbol's history.
    ///
    /// A malformed cache entry counts as a miss: it is refetched and overwritten.
    pub async fn load_symbol(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<SymbolSeries, LoaderError> {
        match self.cache.get(symbol, range) {
            Ok(CacheLookup::Hit(series)) => return Ok(series),
            Ok(CacheLookup::Miss) => {
                debug!(symbol, %range, "Cache miss");
            }
            Err(e) => {
                warn!(symbol, %range, error = %e, "Unreadable cache entry, refetching");
            }
        }

        let fetched = self
            .provider
            .get_daily_bars(symbol, range)
            .await
            .map_err(|source| LoaderError::Retrieval {
                symbol: symbol.to_string(),
                provider: self.provider.name(),
                source,
            })?;

        let series = SymbolSeries::new(symbol, fetched.bars).within(range);
        series.validate()?;

        if series.is_empty() {
            warn!(symbol, provider = self.provider.name(), "Provider returned no bars");
        }

        if let Err(e) = self.cache.put(symbol, range, &series) {
            warn!(symbol, error = %e, "Failed to write cache entry");
        }

        Ok(series)
    }

    /// Load every symbol into a panel, in the given order.
    pub async fn load_panel(
        &self,
        symbols: &[String],
        range: DateRange,
    ) -> Result<PricePanel, LoaderError> {
        let mut series = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            series.push(self.load_symbol(symbol, range).await?);
        }

        let panel = PricePanel::new(series)?;
        info!(
            symbols = panel.len(),
            dates = panel.dates().len(),
            provider = self.provider.name(),
            %range,
            "Price panel loaded"
        );
        Ok(panel)
    }
}
