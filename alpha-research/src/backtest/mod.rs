//! Quantile backtesting of alpha factors.
//!
//! Ranks symbols by factor value each day, tracks group and long-short
//! returns over a fixed horizon, and summarizes them with Sharpe and IC
//! statistics.

mod engine;
mod metrics;
mod quantile;

pub use engine::{
    BacktestConfig, BacktestEngine, IcMethod, LongShortDirection, ParseEnumError, QuantileReturns,
};
pub use metrics::{cumulative_returns, max_drawdown, FactorPerformance};
pub use quantile::assign_quantiles;

// Re-export for convenience
pub use engine::BacktestResult;
