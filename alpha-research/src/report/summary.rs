//! Research summary report.

use serde::Serialize;

use super::correlation::CorrelationMatrix;
use crate::backtest::{BacktestResult, LongShortDirection};
use crate::data::DateRange;
use crate::factors::FactorKind;

/// Summary row for one evaluated factor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorSummary {
    pub factor: FactorKind,
    pub direction: LongShortDirection,
    pub sharpe_ratio: f64,
    pub mean_ic: f64,
    pub ic_ir: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub observations: usize,
}

impl From<&BacktestResult> for FactorSummary {
    fn from(result: &BacktestResult) -> Self {
        let perf = &result.performance;
        Self {
            factor: result.factor,
            direction: result.direction,
            sharpe_ratio: perf.sharpe_ratio,
            mean_ic: perf.mean_ic,
            ic_ir: perf.ic_ir,
            total_return: perf.total_return,
            max_drawdown: perf.max_drawdown,
            observations: perf.observations,
        }
    }
}

/// Research report
#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    /// Report title
    pub title: String,
    /// Research period
    pub period: DateRange,
    /// Number of symbols in the panel
    pub symbols: usize,
    /// Per-factor summary rows
    pub factors: Vec<FactorSummary>,
    /// Factors left out because their long-short series was empty
    pub skipped_factors: Vec<FactorKind>,
    /// Mean Sharpe ratio over factors with a finite Sharpe
    pub average_sharpe: f64,
    /// Factor correlation matrix
    pub correlation: CorrelationMatrix,
    /// Text report (formatted)
    pub text_report: String,
}

impl ResearchReport {
    /// Generate a report from backtest results
    pub fn generate(
        period: DateRange,
        symbols: usize,
        results: &[BacktestResult],
        correlation: CorrelationMatrix,
    ) -> Self {
        let mut factors = Vec::new();
        let mut skipped_factors = Vec::new();
        for result in results {
            if result.long_short.is_empty() {
                tracing::warn!(factor = %result.factor, "Long-short series is empty, skipping factor");
                skipped_factors.push(result.factor);
            } else {
                factors.push(FactorSummary::from(result));
            }
        }

        let average_sharpe = average_sharpe(&factors);
        let text_report = Self::format_text_report(
            &period,
            symbols,
            &factors,
            &skipped_factors,
            average_sharpe,
            &correlation,
        );

        Self {
            title: "Alpha Factor Research Report".to_string(),
            period,
            symbols,
            factors,
            skipped_factors,
            average_sharpe,
            correlation,
            text_report,
        }
    }

    pub fn factor(&self, kind: FactorKind) -> Option<&FactorSummary> {
        self.factors.iter().find(|f| f.factor == kind)
    }

    /// Format as text report
    fn format_text_report(
        period: &DateRange,
        symbols: usize,
        factors: &[FactorSummary],
        skipped: &[FactorKind],
        average_sharpe: f64,
        correlation: &CorrelationMatrix,
    ) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════════════════════\n");
        report.push_str("                 Alpha Factor Research Report\n");
        report.push_str("═══════════════════════════════════════════════════════════════\n\n");

        report.push_str(&format!("📅 Period: {} to {}\n", period.start, period.end));
        report.push_str(&format!("🏷️ Symbols: {}\n\n", symbols));

        report.push_str("📊 Factor Performance\n");
        report.push_str("───────────────────────────────────────────────────────────────\n");
        report.push_str(&format!(
            "  {:<20} {:>10} {:>10} {:>10} {:>8}\n",
            "Factor", "Sharpe", "Mean IC", "IC-IR", "Days"
        ));
        for f in factors {
            report.push_str(&format!(
                "  {:<20} {:>10.4} {:>10.4} {:>10.4} {:>8}\n",
                f.factor.name(),
                f.sharpe_ratio,
                f.mean_ic,
                f.ic_ir,
                f.observations
            ));
        }
        report.push_str(&format!("\n  Average Sharpe:      {:>10.4}\n", average_sharpe));
        if !skipped.is_empty() {
            let names: Vec<&str> = skipped.iter().map(|k| k.name()).collect();
            report.push_str(&format!("  Skipped (no long-short data): {}\n", names.join(", ")));
        }
        report.push('\n');

        report.push_str("📈 Long-Short Returns\n");
        report.push_str("───────────────────────────────────────────────────────────────\n");
        for f in factors {
            report.push_str(&format!(
                "  {:<20} {:<16} total {:>8.2}%  max drawdown {:>6.2}%\n",
                f.factor.name(),
                f.direction.to_string(),
                f.total_return * 100.0,
                f.max_drawdown * 100.0
            ));
        }
        report.push('\n');

        report.push_str("🔗 Factor Correlation\n");
        report.push_str("───────────────────────────────────────────────────────────────\n");
        for line in correlation.format_table().lines() {
            report.push_str("  ");
            report.push_str(line);
            report.push('\n');
        }

        report.push_str("\n═══════════════════════════════════════════════════════════════\n");
        report
    }
}

/// Mean of the finite Sharpe ratios; NaN when there are none.
pub fn average_sharpe(factors: &[FactorSummary]) -> f64 {
    let finite: Vec<f64> = factors
        .iter()
        .map(|f| f.sharpe_ratio)
        .filter(|s| s.is_finite())
        .collect();
    if finite.is_empty() {
        f64::NAN
    } else {
        crate::stats::mean(&finite)
    }
}

// ============================================================================
// Tests
// ============================================================================
