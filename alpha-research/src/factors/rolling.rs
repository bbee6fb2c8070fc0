//! Cell-wise helpers for the factor transforms.

use super::FactorCell;
use crate::stats;

/// Simple return from `prev` to `curr`.
pub(crate) fn pct_change(prev: f64, curr: f64) -> FactorCell {
    FactorCell::ratio(curr - prev, prev)
}

/// Trailing moving average over `window` cells.
///
/// The first `window` outputs are `InsufficientHistory` (the input's first
/// cell has no predecessor, so the first full window ends at index `window`).
/// A window holding any undefined cell takes that cell's state.
pub(crate) fn trailing_mean(cells: &[FactorCell], window: usize) -> Vec<FactorCell> {
    let mut out = vec![FactorCell::InsufficientHistory; cells.len()];

    for t in window..cells.len() {
        let slice = &cells[t + 1 - window..=t];
        out[t] = match slice.iter().find(|c| !c.is_defined()) {
            Some(undefined) => *undefined,
            None => {
                let values: Vec<f64> = slice.iter().filter_map(FactorCell::value).collect();
                FactorCell::Value(stats::mean(&values))
            }
        };
    }

    out
}
