//! Price reversal factor.

use super::rolling::pct_change;
use super::FactorCell;

/// `-(close[t] - close[t-window]) / close[t-window]`.
///
/// Short-term losers score high, winners score low.
pub fn price_reversal(closes: &[f64], window: usize) -> Vec<FactorCell> {
    closes
        .iter()
        .enumerate()
        .map(|(t, &close)| {
            if t < window {
                FactorCell::InsufficientHistory
            } else {
                pct_change(closes[t - window], close).map(|r| -r)
            }
        })
        .collect()
}
