//! Pairwise factor correlation.

use serde::{Deserialize, Serialize};

use crate::factors::{FactorFrame, FactorKind};
use crate::stats;

/// Symmetric Pearson correlation matrix between factors.
///
/// Values are aligned on (date, symbol); a pair only contributes where both
/// factors are defined. Cells without enough overlapping data are NaN, the
/// diagonal is always 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub factors: Vec<FactorKind>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn from_frames(frames: &[FactorFrame]) -> Self {
        let n = frames.len();
        let keyed: Vec<_> = frames.iter().map(FactorFrame::values_by_key).collect();
        let mut values = vec![vec![f64::NAN; n]; n];

        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                // Walk frame i in panel order so the sums are reproducible.
                let (x, y): (Vec<f64>, Vec<f64>) = frames[i]
                    .series
                    .iter()
                    .flat_map(|s| {
                        s.defined().filter_map(|(date, a)| {
                            keyed[j].get(&(date, s.symbol.as_str())).map(|b| (a, *b))
                        })
                    })
                    .unzip();
                let r = stats::pearson(&x, &y);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Self {
            factors: frames.iter().map(|f| f.kind).collect(),
            values,
        }
    }

    pub fn get(&self, a: FactorKind, b: FactorKind) -> Option<f64> {
        let i = self.factors.iter().position(|k| *k == a)?;
        let j = self.factors.iter().position(|k| *k == b)?;
        Some(self.values[i][j])
    }

    /// One decimal for values within 1e-10 of an integer, four otherwise.
    pub fn format_cell(value: f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else if (value - value.round()).abs() < 1e-10 {
            format!("{:.1}", value)
        } else {
            format!("{:.4}", value)
        }
    }

    /// Fixed-width text table.
    pub fn format_table(&self) -> String {
        let width = self
            .factors
            .iter()
            .map(|k| k.name().len())
            .max()
            .unwrap_or(0)
            .max(8);

        let mut out = format!("{:width$}", "", width = width);
        for kind in &self.factors {
            out.push_str(&format!("  {:>width$}", kind.name(), width = width));
        }
        out.push('\n');

        for (kind, row) in self.factors.iter().zip(&self.values) {
            out.push_str(&format!("{:width$}", kind.name(), width = width));
            for value in row {
                out.push_str(&format!("  {:>width$}", Self::format_cell(*value), width = width));
            }
            out.push('\n');
        }
        out
    }
}
