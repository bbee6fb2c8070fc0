//! Alpha Research Library
//!
//! Daily cross-sectional factor research for A-shares: three alpha factors
//! computed over a panel of price histories, evaluated with a quantile
//! backtest and summarized in a report.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │  PanelLoader  │──▶│    Factor     │──▶│   Backtest    │──▶│    Report     │
//! │ provider+cache│   │    Engine     │   │    Engine     │   │ summary, corr │
//! └───────────────┘   └───────────────┘   └───────────────┘   └───────────────┘
//! ```
//!
//! # Factors
//!
//! - **Price Reversal**: negated 5-day return
//! - **Volume-Price Ratio**: 10-day average of volume change over price change
//! - **Volatility Breakout**: close outside the 20-day mean ± 2σ envelope
//!
//! # Evaluation
//!
//! Each date, symbols are split into quantile groups by factor value. The
//! spread between the extreme groups gives a daily long-short return, from
//! which the Sharpe ratio and cumulative return follow; the rank correlation
//! between factor and forward return gives the IC series and IC-IR.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod backtest;
pub mod data;
pub mod factors;
pub mod report;
pub mod stats;

use alpha_common::config::Config;
use anyhow::{Context, Result};
use std::sync::Arc;

use crate::backtest::{BacktestConfig, BacktestEngine, BacktestResult, LongShortDirection};
use crate::data::{
    CacheStore, CsvCacheStore, DataProvider, DateRange, PanelLoader, PricePanel,
    SyntheticProvider,
};
use crate::factors::{FactorFrame, FactorParams};
use crate::report::{CorrelationMatrix, ResearchReport};

/// Everything produced by one research run.
#[derive(Debug, Clone)]
pub struct ResearchRun {
    /// Panel after the coverage filter
    pub panel: PricePanel,
    /// One frame per factor
    pub frames: Vec<FactorFrame>,
    /// One backtest per factor, in frame order
    pub results: Vec<BacktestResult>,
    /// Summary report
    pub report: ResearchReport,
}

/// Research pipeline service
pub struct ResearchService {
    config: Config,
    loader: PanelLoader,
}

impl ResearchService {
    /// Create a service backed by the synthetic provider and the CSV cache
    /// in the configured cache directory.
    pub fn new(config: Config) -> Self {
        let provider = Arc::new(SyntheticProvider::new(config.data.seed));
        let cache = Arc::new(CsvCacheStore::new(config.cache_dir()));
        Self::with_components(config, provider, cache)
    }

    /// Create a service with explicit data components.
    pub fn with_components(
        config: Config,
        provider: Arc<dyn DataProvider>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            loader: PanelLoader::new(provider, cache),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load data, compute every factor, backtest each one and build the report.
    pub async fn run(&self) -> Result<ResearchRun> {
        let (start, end) = self.config.data.date_window();
        let range = DateRange::new(start, end)?;

        let loaded = self
            .loader
            .load_panel(&self.config.data.symbols, range)
            .await
            .context("Failed to load price panel")?;

        let threshold = self.config.data.coverage_threshold;
        let panel = loaded.filter_by_coverage(threshold);
        let dates = panel.dates();
        tracing::info!(
            before = loaded.dates().len(),
            after = dates.len(),
            threshold,
            "Applied coverage filter"
        );
        if dates.is_empty() {
            tracing::warn!("No dates left after the coverage filter");
        }

        let params = FactorParams::from_config(&self.config.research);
        let frames = factors::compute_all(&params, &panel);

        let engine = BacktestEngine::new(
            BacktestConfig::from_research(&self.config.research)
                .context("Invalid backtest configuration")?,
        );
        let mut results = Vec::with_capacity(frames.len());
        for frame in &frames {
            let direction = LongShortDirection::for_factor(&self.config.research, frame.kind)
                .context("Invalid long-short direction")?;
            results.push(engine.run(&panel, frame, direction));
        }

        let correlation = CorrelationMatrix::from_frames(&frames);
        let period = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => DateRange::new(*first, *last)?,
            _ => range,
        };
        let report = ResearchReport::generate(period, panel.len(), &results, correlation);

        tracing::info!(
            factors = report.factors.len(),
            skipped = report.skipped_factors.len(),
            average_sharpe = report.average_sharpe,
            "Research run completed"
        );

        Ok(ResearchRun {
            panel,
            frames,
            results,
            report,
        })
    }
}
