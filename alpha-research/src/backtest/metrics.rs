//! Factor performance metrics.

use serde::{Deserialize, Serialize};

use crate::stats;

/// Compounded growth of one unit: `prod(1 + r)` after each period.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |wealth, r| {
            *wealth *= 1.0 + r;
            Some(*wealth)
        })
        .collect()
}

/// Largest peak-to-trough decline of a wealth curve, as a fraction of the
/// peak. The curve implicitly starts at 1.0.
pub fn max_drawdown(wealth: &[f64]) -> f64 {
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for &w in wealth {
        peak = peak.max(w);
        if peak > 0.0 {
            worst = worst.max((peak - w) / peak);
        }
    }
    worst
}

/// Performance record of one factor's backtest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorPerformance {
    /// Annualized Sharpe ratio of the long-short series
    pub sharpe_ratio: f64,
    /// Mean information coefficient
    pub mean_ic: f64,
    /// Sample standard deviation of the IC series
    pub ic_std: f64,
    /// Information ratio of the IC series (mean / std)
    pub ic_ir: f64,
    /// Compounded long-short return over the whole period
    pub total_return: f64,
    /// Maximum drawdown of the long-short wealth curve (fraction)
    pub max_drawdown: f64,
    /// Number of long-short observations
    pub observations: usize,
    /// Number of dates with a defined IC
    pub ic_observations: usize,
}

impl FactorPerformance {
    /// Calculate metrics from the long-short and IC series.
    ///
    /// Statistics over fewer than two observations or zero variance are NaN.
    pub fn from_series(long_short: &[f64], ic: &[f64], trading_days_per_year: f64) -> Self {
        let wealth = cumulative_returns(long_short);
        let total_return = wealth.last().map_or(0.0, |w| w - 1.0);

        Self {
            sharpe_ratio: stats::mean_over_std(long_short) * trading_days_per_year.sqrt(),
            mean_ic: stats::mean(ic),
            ic_std: stats::std_dev(ic),
            ic_ir: stats::mean_over_std(ic),
            total_return,
            max_drawdown: max_drawdown(&wealth),
            observations: long_short.len(),
            ic_observations: ic.len(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumulative_returns_compound() {
        let wealth = cumulative_returns(&[0.1, -0.1, 0.05]);
        assert!((wealth[0] - 1.1).abs() < 1e-12);
        assert!((wealth[1] - 0.99).abs() < 1e-12);
        assert!((wealth[2] - 1.0395).abs() < 1e-12);
        assert!(cumulative_returns(&[]).is_empty());
    }

    #[test]
    fn test_max_drawdown() {
        let wealth = [1.1, 0.99, 1.2, 0.9, 1.0];
        assert!((max_drawdown(&wealth) - 0.25).abs() < 1e-12);
        assert_eq!(max_drawdown(&[1.01, 1.02]), 0.0);
        assert!((max_drawdown(&[0.8]) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_performance_from_series() {
        let ls = [0.01, -0.005, 0.02, 0.0];
        let ic = [0.1, 0.3, 0.2];
        let perf = FactorPerformance::from_series(&ls, &ic, 252.0);

        let mean = 0.025 / 4.0;
        let var = ls.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 3.0;
        let expected = mean / var.sqrt() * 252.0_f64.sqrt();
        assert!((perf.sharpe_ratio - expected).abs() < 1e-9);

        assert!((perf.mean_ic - 0.2).abs() < 1e-12);
        assert!((perf.ic_std - 0.1).abs() < 1e-12);
        assert!((perf.ic_ir - 2.0).abs() < 1e-9);
        assert_eq!(perf.observations, 4);
        assert_eq!(perf.ic_observations, 3);
    }

    #[test]
    fn test_constant_ic_gives_nan_ir() {
        let perf = FactorPerformance::from_series(&[0.01, 0.01], &[0.05, 0.05, 0.05], 252.0);
        assert!(perf.ic_ir.is_nan());
        assert!(perf.sharpe_ratio.is_nan());
        assert!((perf.total_return - 0.0201).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series() {
        let perf = FactorPerformance::from_series(&[], &[], 252.0);
        assert!(perf.sharpe_ratio.is_nan());
        assert!(perf.mean_ic.is_nan());
        assert!(perf.ic_ir.is_nan());
        assert_eq!(perf.total_return, 0.0);
        assert_eq!(perf.max_drawdown, 0.0);
    }
}
