//! Synthetic price source.
//!
//! Generates a seeded geometric random walk over business days. Every symbol
//! gets its own deterministic stream, so reruns with the same seed reproduce
//! the same panel.

use async_trait::async_trait;
use chrono::{Datelike, Duration, Weekday};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

use super::provider::{DataProvider, ProviderError};
use super::{Bar, DateRange, SymbolSeries};

/// Starting close for every synthetic symbol.
const START_PRICE: f64 = 100.0;
/// Mean and standard deviation of daily close-to-close returns.
const DAILY_DRIFT: f64 = 0.0005;
const DAILY_VOL: f64 = 0.015;
/// Standard deviation of the open gap against the previous close.
const OPEN_GAP_VOL: f64 = 0.005;
/// Maximum intraday extension beyond open/close.
const INTRADAY_RANGE: f64 = 0.015;

/// Seeded random-walk provider.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// FNV-1a over the symbol, mixed with the seed.
    fn symbol_seed(&self, symbol: &str) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in symbol.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash ^ self.seed
    }

    /// Generate bars for every business day in `range`.
    pub fn generate(&self, symbol: &str, range: DateRange) -> Result<SymbolSeries, ProviderError> {
        let returns = Normal::new(DAILY_DRIFT, DAILY_VOL)
            .map_err(|e| ProviderError::Internal(e.to_string()))?;
        let gaps =
            Normal::new(0.0, OPEN_GAP_VOL).map_err(|e| ProviderError::Internal(e.to_string()))?;
        let mut rng = StdRng::seed_from_u64(self.symbol_seed(symbol));

        let mut bars: Vec<Bar> = Vec::new();
        let mut date = range.start;
        while date <= range.end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let (close, open, daily_return) = match bars.last() {
                    None => {
                        let close = START_PRICE;
                        (close, close * (1.0 + gaps.sample(&mut rng)), 0.0)
                    }
                    Some(prev) => {
                        let r = returns.sample(&mut rng);
                        let close = prev.close * (1.0 + r);
                        (close, prev.close * (1.0 + gaps.sample(&mut rng)), r)
                    }
                };

                let high = open.max(close) * (1.0 + rng.gen_range(0.0..INTRADAY_RANGE));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..INTRADAY_RANGE));
                let volume = rng.gen_range(1e6..5e6) * (1.0 + 5.0 * daily_return.abs());

                bars.push(Bar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume,
                });
            }
            date += Duration::days(1);
        }

        Ok(SymbolSeries::new(symbol, bars))
    }
}

#[async_trait]
impl DataProvider for SyntheticProvider {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn get_daily_bars(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<SymbolSeries, ProviderError> {
        self.generate(symbol, range)
    }
}
