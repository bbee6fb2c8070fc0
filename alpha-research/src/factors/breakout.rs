//! Volatility breakout factor.

use super::FactorCell;
use crate::stats;

/// +1 when the close breaks above `mean + band * std` of the previous
/// `window` closes, -1 below `mean - band * std`, 0 inside the envelope.
///
/// The envelope excludes the current close, so the first `window`
/// observations are undefined.
pub fn volatility_breakout(closes: &[f64], window: usize, band: f64) -> Vec<FactorCell> {
    closes
        .iter()
        .enumerate()
        .map(|(t, &close)| {
            if t < window {
                return FactorCell::InsufficientHistory;
            }
            let history = &closes[t - window..t];
            let mean = stats::mean(history);
            let sd = stats::std_dev(history);
            if sd.is_nan() {
                return FactorCell::InsufficientHistory;
            }

            let signal = if close > mean + band * sd {
                1.0
            } else if close < mean - band * sd {
                -1.0
            } else {
                0.0
            };
            FactorCell::Value(signal)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_flat(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect()
    }

    #[test]
    fn test_breakout_up_and_down() {
        let mut closes = noisy_flat(22);
        closes.push(120.0);
        closes.push(80.0);
        let out = volatility_breakout(&closes, 20, 2.0);

        assert!(out[..20].iter().all(|c| *c == FactorCell::InsufficientHistory));
        assert_eq!(out[20], FactorCell::Value(0.0));
        assert_eq!(out[22], FactorCell::Value(1.0));
        assert_eq!(out[23], FactorCell::Value(-1.0));
    }

    #[test]
    fn test_signal_matches_envelope() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 1.3).sin() * 3.0 + (i as f64 * 0.05).powi(2))
            .collect();
        let out = volatility_breakout(&closes, 20, 2.0);

        let (mut ups, mut downs) = (0, 0);
        for t in 20..closes.len() {
            let prev = &closes[t - 20..t];
            let mu = prev.iter().sum::<f64>() / 20.0;
            let sigma = (prev.iter().map(|c| (c - mu).powi(2)).sum::<f64>() / 19.0).sqrt();
            let v = out[t].value().unwrap();

            assert_eq!(v == 1.0, closes[t] > mu + 2.0 * sigma, "t={t}");
            assert_eq!(v == -1.0, closes[t] < mu - 2.0 * sigma, "t={t}");
            assert!(v == -1.0 || v == 0.0 || v == 1.0);
            ups += usize::from(v == 1.0);
            downs += usize::from(v == -1.0);
        }
        // The quadratic drift pushes the late closes above the envelope.
        assert!(ups > 0);
        assert!(ups + downs < closes.len() - 20);
    }

    #[test]
    fn test_flat_history_breaks_on_any_move() {
        let mut closes = vec![50.0; 5];
        closes.push(50.0);
        closes.push(50.5);
        let out = volatility_breakout(&closes, 5, 2.0);
        assert_eq!(out[5], FactorCell::Value(0.0));
        // Zero-width envelope.
        assert_eq!(out[6], FactorCell::Value(1.0));
    }
}
