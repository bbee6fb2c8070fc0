//! Cross-sectional quantile grouping.

/// Assign each value a 0-based group index in `0..groups`.
///
/// Values are ranked ascending (stable, so ties keep input order) and the
/// value at rank `r` of `n` lands in group `r * groups / n`. Group sizes
/// differ by at most one. Returns `None` when there are fewer values than
/// groups or `groups` is zero.
pub fn assign_quantiles(values: &[f64], groups: usize) -> Option<Vec<usize>> {
    let n = values.len();
    if groups == 0 || n < groups {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut assigned = vec![0; n];
    for (rank, &idx) in order.iter().enumerate() {
        assigned[idx] = rank * groups / n;
    }
    Some(assigned)
}
