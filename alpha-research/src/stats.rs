//! Descriptive statistics shared by the factor and backtest engines.
//!
//! Every function returns NaN instead of failing when its input is too short
//! or degenerate (zero variance).

use statrs::statistics::Statistics;

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.mean()
}

/// Sample standard deviation (n - 1); NaN for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    values.std_dev()
}

/// `mean / std`, NaN when the standard deviation is zero or undefined.
pub fn mean_over_std(values: &[f64]) -> f64 {
    // Rounding in the running variance can leave a constant series with a
    // tiny non-zero std.
    if values.windows(2).all(|w| w[0] == w[1]) {
        return f64::NAN;
    }
    let sd = std_dev(values);
    if sd.is_nan() || sd == 0.0 {
        return f64::NAN;
    }
    mean(values) / sd
}

/// Pearson correlation; NaN on length mismatch, < 2 points or zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

/// 1-based ranks with ties sharing their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Spearman rank correlation: Pearson correlation of average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() {
        return f64::NAN;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&v) - 5.0).abs() < 1e-12);
        // Sample variance 32 / 7.
        assert!((std_dev(&v) - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[1.0]).is_nan());
    }

    #[test]
    fn test_mean_over_std_constant_is_nan() {
        assert!(mean_over_std(&[0.1, 0.1, 0.1]).is_nan());
        assert!(mean_over_std(&[0.07; 50]).is_nan());
        assert!(mean_over_std(&[0.1]).is_nan());
        assert!(mean_over_std(&[]).is_nan());
        let v = [1.0, 2.0, 3.0];
        assert!((mean_over_std(&v) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_nan());
        assert!(pearson(&x, &[1.0, 2.0]).is_nan());
        assert!(pearson(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(
            average_ranks(&[10.0, 30.0, 20.0, 30.0]),
            vec![1.0, 3.5, 2.0, 3.5]
        );
        assert_eq!(average_ranks(&[]), Vec::<f64>::new());
    }

    #[test]
    fn test_spearman_monotonic() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 100.0];
        assert!((spearman(&x, &y) - 1.0).abs() < 1e-12);
        let rev: Vec<f64> = y.iter().rev().copied().collect();
        assert!((spearman(&x, &rev) + 1.0).abs() < 1e-12);
    }
}
