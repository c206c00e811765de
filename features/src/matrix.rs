//! Feature matrix output shared by every engine.

use serde::{Deserialize, Serialize};
use sonid_dsp::{round_to, stats};

/// A processed feature matrix, one row per frame.
///
/// `mean` and `stddev` hold per-column statistics over the rows. Engines
/// leave them unset when fewer than two rows were produced; the power
/// spectrum never fills them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub rows: Vec<Vec<f64>>,
    pub mean: Option<Vec<f64>>,
    pub stddev: Option<Vec<f64>>,
}

impl FeatureMatrix {
    /// Joins the coefficients of row `index` with a `;` separator.
    pub fn join_row(&self, index: usize) -> Option<String> {
        self.rows.get(index).map(|row| {
            row.iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(";")
        })
    }
}

/// Column-wise mean and standard deviation, rounded like the
/// coefficients themselves.
pub(crate) fn column_stats(rows: &[Vec<f64>]) -> (Vec<f64>, Vec<f64>) {
    let columns = rows.first().map_or(0, Vec::len);
    let mut mean = vec![0.0; columns];
    let mut stddev = vec![0.0; columns];
    let mut column = vec![0.0; rows.len()];
    for c in 0..columns {
        for (value, row) in column.iter_mut().zip(rows) {
            *value = row[c];
        }
        mean[c] = round_to(stats::mean(&column), 4);
        stddev[c] = round_to(stats::std_deviation(&column), 4);
    }
    (mean, stddev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_row_uses_semicolons() {
        let matrix = FeatureMatrix {
            rows: vec![vec![1.5, -2.25, 0.0]],
            mean: None,
            stddev: None,
        };
        assert_eq!(matrix.join_row(0).unwrap(), "1.5;-2.25;0");
        assert!(matrix.join_row(1).is_none());
    }

    #[test]
    fn column_stats_are_rounded() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let (mean, stddev) = column_stats(&rows);
        assert_eq!(mean, vec![2.0, 20.0]);
        assert_eq!(stddev, vec![1.0, 10.0]);
    }
}
