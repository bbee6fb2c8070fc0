//! Integration tests for the read-through panel loader.
//!
//! Verifies that cached histories are served without hitting the provider,
//! that unreadable cache files are refetched and overwritten, and that a
//! provider failure aborts the load.

use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use alpha_research::data::{
    Bar, CacheLookup, CacheStore, CsvCacheStore, DataProvider, DateRange, LoaderError,
    MemoryCacheStore, PanelLoader, ProviderError, SymbolSeries,
};

// ============================================================================
// Mock Providers for Testing
// ============================================================================

/// Mock provider that counts calls and can be configured to fail
struct CountingProvider {
    should_fail: bool,
    calls: AtomicU32,
}

impl CountingProvider {
    fn new(should_fail: bool) -> Self {
        Self {
            should_fail,
            calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DataProvider for CountingProvider {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn get_daily_bars(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<SymbolSeries, ProviderError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.should_fail {
            return Err(ProviderError::Network("mock network failure".into()));
        }

        // One bar per calendar day, plus one either side of the range.
        let mut bars = Vec::new();
        let mut date = range.start - Duration::days(1);
        let mut close = 10.0;
        while date <= range.end + Duration::days(1) {
            bars.push(Bar {
                date,
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1000.0 + close,
            });
            close += 0.25;
            date += Duration::days(1);
        }
        Ok(SymbolSeries::new(symbol, bars))
    }
}

fn range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
    )
    .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_fetched_bars_are_clipped_to_range() {
    let provider = Arc::new(CountingProvider::new(false));
    let loader = PanelLoader::new(provider.clone(), Arc::new(MemoryCacheStore::new()));

    let series = loader.load_symbol("600519", range()).await.unwrap();

    assert_eq!(series.len(), 10);
    assert_eq!(series.bars[0].date, range().start);
    assert_eq!(series.bars[9].date, range().end);
}

#[tokio::test]
async fn test_cache_hit_avoids_refetch() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(CountingProvider::new(false));
    let cache = Arc::new(CsvCacheStore::new(dir.path()));
    let loader = PanelLoader::new(provider.clone(), cache.clone());

    let first = loader.load_symbol("600519", range()).await.unwrap();
    assert_eq!(provider.call_count(), 1);
    assert!(cache.path_for("600519", range()).exists());

    let second = loader.load_symbol("600519", range()).await.unwrap();
    assert_eq!(provider.call_count(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cache_survives_new_loader() {
    let dir = TempDir::new().unwrap();
    let first_provider = Arc::new(CountingProvider::new(false));
    PanelLoader::new(first_provider.clone(), Arc::new(CsvCacheStore::new(dir.path())))
        .load_symbol("000001", range())
        .await
        .unwrap();

    // A failing provider is never consulted when the file is present.
    let failing = Arc::new(CountingProvider::new(true));
    let loader = PanelLoader::new(failing.clone(), Arc::new(CsvCacheStore::new(dir.path())));
    let series = loader.load_symbol("000001", range()).await.unwrap();

    assert_eq!(series.len(), 10);
    assert_eq!(failing.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_cache_is_refetched_and_overwritten() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(CountingProvider::new(false));
    let cache = Arc::new(CsvCacheStore::new(dir.path()));
    let path = cache.path_for("600036", range());
    fs::write(&path, "date,open,high,low,close,volume\nnot-a-date,1,2,3,4,5\n").unwrap();
    assert!(cache.get("600036", range()).is_err());

    let loader = PanelLoader::new(provider.clone(), cache.clone());
    let series = loader.load_symbol("600036", range()).await.unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(series.len(), 10);
    match cache.get("600036", range()).unwrap() {
        CacheLookup::Hit(cached) => assert_eq!(cached, series),
        CacheLookup::Miss => panic!("expected the refetched history to be cached"),
    }
}

#[tokio::test]
async fn test_provider_failure_aborts_panel_load() {
    let provider = Arc::new(CountingProvider::new(true));
    let loader = PanelLoader::new(provider.clone(), Arc::new(MemoryCacheStore::new()));

    let symbols = vec!["600519".to_string(), "000001".to_string()];
    let err = loader.load_panel(&symbols, range()).await.unwrap_err();

    match err {
        LoaderError::Retrieval {
            symbol, provider, ..
        } => {
            assert_eq!(symbol, "600519");
            assert_eq!(provider, "counting");
        }
        other => panic!("unexpected error: {other}"),
    }
    // The load stops at the first failing symbol.
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_panel_keeps_symbol_order() {
    let provider = Arc::new(CountingProvider::new(false));
    let cache = Arc::new(MemoryCacheStore::new());
    let loader = PanelLoader::new(provider.clone(), cache.clone());

    let symbols = vec!["600036".to_string(), "000001".to_string(), "600519".to_string()];
    let panel = loader.load_panel(&symbols, range()).await.unwrap();

    assert_eq!(panel.symbols(), vec!["600036", "000001", "600519"]);
    assert_eq!(panel.dates().len(), 10);
    assert_eq!(cache.len(), 3);
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_duplicate_symbols_rejected() {
    let provider = Arc::new(CountingProvider::new(false));
    let loader = PanelLoader::new(provider, Arc::new(MemoryCacheStore::new()));

    let symbols = vec!["600519".to_string(), "600519".to_string()];
    let err = loader.load_panel(&symbols, range()).await.unwrap_err();
    assert!(matches!(err, LoaderError::Panel(_)));
}
