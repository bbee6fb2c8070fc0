//! Volume-price ratio factor.

use super::rolling::{pct_change, trailing_mean};
use super::FactorCell;

/// Moving average over `window` days of `volume change / price change`.
///
/// A flat close (or a zero previous close/volume) makes that day's ratio
/// `DivisionByZero`, and so every average whose window covers it.
pub fn volume_price_ratio(closes: &[f64], volumes: &[f64], window: usize) -> Vec<FactorCell> {
    let n = closes.len().min(volumes.len());

    let daily: Vec<FactorCell> = (0..n)
        .map(|t| {
            if t == 0 {
                return FactorCell::InsufficientHistory;
            }
            let volume_change = pct_change(volumes[t - 1], volumes[t]);
            let price_change = pct_change(closes[t - 1], closes[t]);
            match (volume_change.value(), price_change.value()) {
                (Some(v), Some(p)) => FactorCell::ratio(v, p),
                _ => FactorCell::DivisionByZero,
            }
        })
        .collect();

    trailing_mean(&daily, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, start: f64, step: f64) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn test_first_window_undefined() {
        let closes = ramp(15, 100.0, 1.0);
        let volumes = ramp(15, 1000.0, 10.0);
        let out = volume_price_ratio(&closes, &volumes, 10);
        assert!(out[..10].iter().all(|c| *c == FactorCell::InsufficientHistory));
        assert!(out[10..].iter().all(FactorCell::is_defined));
    }

    #[test]
    fn test_value_matches_manual_average() {
        let closes = [10.0, 11.0, 12.1, 12.1 * 0.9];
        let volumes = [100.0, 150.0, 150.0, 300.0];
        let out = volume_price_ratio(&closes, &volumes, 2);

        // day1: 0.5 / 0.1, day2: 0 / 0.1, day3: 1.0 / -0.1
        let d1 = 0.5 / ((11.0 - 10.0) / 10.0);
        let d2 = 0.0;
        let d3 = 1.0 / ((12.1 * 0.9 - 12.1) / 12.1);
        assert!((out[2].as_f64() - (d1 + d2) / 2.0).abs() < 1e-9);
        assert!((out[3].as_f64() - (d2 + d3) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_price_is_division_by_zero() {
        let mut closes = ramp(14, 100.0, 1.0);
        closes[11] = closes[10];
        let volumes = ramp(14, 1000.0, 10.0);
        let out = volume_price_ratio(&closes, &volumes, 2);

        assert!(out[10].is_defined());
        assert_eq!(out[11], FactorCell::DivisionByZero);
        assert_eq!(out[12], FactorCell::DivisionByZero);
        assert!(out[13].is_defined());
    }

    #[test]
    fn test_zero_previous_volume() {
        let closes = ramp(4, 100.0, 1.0);
        let volumes = [0.0, 10.0, 20.0, 30.0];
        let out = volume_price_ratio(&closes, &volumes, 1);
        assert_eq!(out[1], FactorCell::DivisionByZero);
        assert!(out[2].is_defined());
    }
}
