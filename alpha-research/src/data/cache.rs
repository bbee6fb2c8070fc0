//! Read-through cache stores for daily price history.
//!
//! A store is handed to the loader explicitly; nothing here touches a global
//! directory. Entries are keyed by symbol and requested date range.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

use super::{Bar, DateRange, SymbolSeries};

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(SymbolSeries),
    Miss,
}

/// Cache store errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed cache file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("failed to write cache file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Storage for fetched price history.
pub trait CacheStore: Send + Sync {
    /// Look up the history cached for `symbol` over `range`.
    fn get(&self, symbol: &str, range: DateRange) -> Result<CacheLookup, CacheError>;

    /// Store the history for `symbol` over `range`, replacing any previous entry.
    fn put(&self, symbol: &str, range: DateRange, series: &SymbolSeries) -> Result<(), CacheError>;
}

// ============================================================================
// CSV Store
// ============================================================================

/// File-backed store: one `date,open,high,low,close,volume` CSV per symbol and range.
///
/// Floats are written in shortest round-trip form, so a read returns the
/// exact values that were stored.
#[derive(Debug, Clone)]
pub struct CsvCacheStore {
    dir: PathBuf,
}

impl CsvCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a cache entry.
    ///
    /// Bytes of the symbol outside `[A-Za-z0-9.-]` are written as `%XX`,
    /// so distinct symbols never share a file.
    pub fn path_for(&self, symbol: &str, range: DateRange) -> PathBuf {
        let safe = symbol.bytes().fold(String::with_capacity(symbol.len()), |mut acc, b| {
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'-' {
                acc.push(char::from(b));
            } else {
                acc.push_str(&format!("%{:02X}", b));
            }
            acc
        });
        self.dir.join(format!("{}_{}.csv", safe, range))
    }

    fn read_bars(path: &Path, file: File) -> Result<Vec<Bar>, CacheError> {
        let mut reader = csv::Reader::from_reader(file);
        let mut bars = Vec::new();

        for record in reader.deserialize::<Bar>() {
            let bar = record.map_err(|e| CacheError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            bars.push(bar);
        }

        Ok(bars)
    }
}

impl CacheStore for CsvCacheStore {
    fn get(&self, symbol: &str, range: DateRange) -> Result<CacheLookup, CacheError> {
        let path = self.path_for(symbol, range);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CacheLookup::Miss),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let bars = Self::read_bars(&path, file)?;
        let series = SymbolSeries::new(symbol, bars);
        series.validate().map_err(|e| CacheError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        debug!(symbol, path = %path.display(), bars = series.len(), "Cache hit");
        Ok(CacheLookup::Hit(series))
    }

    fn put(&self, symbol: &str, range: DateRange, series: &SymbolSeries) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(symbol, range);
        let tmp = path.with_extension("csv.tmp");

        let write = || -> Result<(), csv::Error> {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for bar in &series.bars {
                writer.serialize(bar)?;
            }
            writer.flush()?;
            Ok(())
        };
        write().map_err(|source| CacheError::Write {
            path: tmp.clone(),
            source,
        })?;

        fs::rename(&tmp, &path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(symbol, path = %path.display(), bars = series.len(), "Cached price history");
        Ok(())
    }
}

// ============================================================================
// In-memory Store
// ============================================================================

/// Process-local store, mostly useful for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, SymbolSeries>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(symbol: &str, range: DateRange) -> String {
        format!("{}:{}", symbol, range)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, symbol: &str, range: DateRange) -> Result<CacheLookup, CacheError> {
        let lookup = self
            .entries
            .read()
            .ok()
            .and_then(|entries| entries.get(&Self::key(symbol, range)).cloned())
            .map_or(CacheLookup::Miss, CacheLookup::Hit);
        Ok(lookup)
    }

    fn put(&self, symbol: &str, range: DateRange, series: &SymbolSeries) -> Result<(), CacheError> {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(Self::key(symbol, range), series.clone());
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{day, series_from_closes};
    use tempfile::tempdir;

    fn range() -> DateRange {
        DateRange::new(day(0), day(30)).unwrap()
    }

    #[test]
    fn test_csv_miss_when_absent() {
        let dir = tempdir().unwrap();
        let store = CsvCacheStore::new(dir.path());
        assert_eq!(store.get("AAA", range()).unwrap(), CacheLookup::Miss);
    }

    #[test]
    fn test_csv_round_trip_is_exact() {
        let dir = tempdir().unwrap();
        let store = CsvCacheStore::new(dir.path().join("nested"));

        let mut series = series_from_closes("sh600519", &[100.0, 101.3, 0.1 + 0.2, 1.0 / 3.0]);
        series.bars[2].volume = 1_234_567.891_011;
        series.bars[3].high = f64::MAX;

        store.put("sh600519", range(), &series).unwrap();
        let path = store.path_for("sh600519", range());
        assert!(path.exists());
        assert!(!path.with_extension("csv.tmp").exists());

        match store.get("sh600519", range()).unwrap() {
            CacheLookup::Hit(loaded) => assert_eq!(loaded, series),
            CacheLookup::Miss => panic!("expected a cache hit"),
        }
    }

    #[test]
    fn test_csv_header() {
        let dir = tempdir().unwrap();
        let store = CsvCacheStore::new(dir.path());
        store
            .put("AAA", range(), &series_from_closes("AAA", &[10.5]))
            .unwrap();

        let content = fs::read_to_string(store.path_for("AAA", range())).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("date,open,high,low,close,volume"));
        assert!(lines.next().unwrap().starts_with("2024-01-01,10.5,10.5,10.5,10.5,1000"));
    }

    #[test]
    fn test_csv_malformed_is_parse_error() {
        let dir = tempdir().unwrap();
        let store = CsvCacheStore::new(dir.path());
        let path = store.path_for("AAA", range());
        fs::write(&path, "date,open,high,low,close,volume\n2024-01-01,abc,1,1,1,1\n").unwrap();

        assert!(matches!(
            store.get("AAA", range()),
            Err(CacheError::Parse { .. })
        ));
    }

    #[test]
    fn test_csv_unordered_is_parse_error() {
        let dir = tempdir().unwrap();
        let store = CsvCacheStore::new(dir.path());
        let path = store.path_for("AAA", range());
        fs::write(
            &path,
            "date,open,high,low,close,volume\n2024-01-02,1,1,1,1,1\n2024-01-01,1,1,1,1,1\n",
        )
        .unwrap();

        assert!(matches!(
            store.get("AAA", range()),
            Err(CacheError::Parse { .. })
        ));
    }

    #[test]
    fn test_path_escapes_symbol() {
        let store = CsvCacheStore::new("/cache");
        assert_eq!(
            store.path_for("sh/600519", range()),
            PathBuf::from("/cache/sh%2F600519_2024-01-01_2024-01-31.csv")
        );
        assert_eq!(
            store.path_for("sh_600519", range()),
            PathBuf::from("/cache/sh%5F600519_2024-01-01_2024-01-31.csv")
        );
        assert_eq!(
            store.path_for("600519.SH", range()),
            PathBuf::from("/cache/600519.SH_2024-01-01_2024-01-31.csv")
        );
    }

    #[test]
    fn test_escaped_symbols_do_not_collide() {
        let dir = tempdir().unwrap();
        let store = CsvCacheStore::new(dir.path());
        let slash = series_from_closes("sh/600519", &[1.0, 2.0]);
        store.put("sh/600519", range(), &slash).unwrap();

        assert_eq!(store.get("sh_600519", range()).unwrap(), CacheLookup::Miss);
        assert_eq!(store.get("sh%2F600519", range()).unwrap(), CacheLookup::Miss);
        assert_eq!(store.get("sh/600519", range()).unwrap(), CacheLookup::Hit(slash));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCacheStore::new();
        assert!(store.is_empty());
        let series = series_from_closes("AAA", &[1.0, 2.0]);
        store.put("AAA", range(), &series).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("AAA", range()).unwrap(), CacheLookup::Hit(series));
        let other = DateRange::new(day(0), day(5)).unwrap();
        assert_eq!(store.get("AAA", other).unwrap(), CacheLookup::Miss);
    }
}
