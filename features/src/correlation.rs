//! Pearson correlation between keyed samples.
//!
//! Samples map a key (a power spectrum frequency in Hz) to a value (its
//! decibel intensity). Only keys present in both samples enter the
//! computation, so two spectra taken over different bands compare on
//! the band they share.

use std::collections::BTreeMap;

use serde::Serialize;

/// Sample keyed by frequency.
pub type KeyedSample = BTreeMap<i64, f64>;

/// Outcome of a correlation between two keyed samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    /// Pearson correlation coefficient, in [-1, 1].
    pub r: f64,
    /// Coefficient of determination, `r` squared.
    pub determination: f64,
    /// Shared keys that entered the computation.
    pub records: usize,
}

/// Correlates the values of the keys shared by `x` and `y`.
///
/// When fewer than `min_records` keys are shared the coefficient is 0,
/// as it is for degenerate data (constant or empty samples). A
/// `min_records` of 0 disables the gate.
pub fn pearson(x: &KeyedSample, y: &KeyedSample, min_records: usize) -> Correlation {
    let paired: Vec<(f64, f64)> = x
        .iter()
        .filter_map(|(key, &value_x)| y.get(key).map(|&value_y| (value_x, value_y)))
        .collect();
    let records = paired.len();

    let mut r = 0.0;
    if min_records == 0 || records >= min_records {
        let n = records as f64;
        let sum_x: f64 = paired.iter().map(|(x, _)| x).sum();
        let sum_y: f64 = paired.iter().map(|(_, y)| y).sum();
        let sum_x_sq: f64 = paired.iter().map(|(x, _)| x * x).sum();
        let sum_y_sq: f64 = paired.iter().map(|(_, y)| y * y).sum();
        let sum_xy: f64 = paired.iter().map(|(x, y)| x * y).sum();

        r = (n * sum_xy - sum_x * sum_y)
            / ((n * sum_x_sq - sum_x * sum_x).sqrt() * (n * sum_y_sq - sum_y * sum_y).sqrt());
    }
    if r.is_nan() {
        r = 0.0;
    }

    Correlation {
        r,
        determination: r * r,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pairs: &[(i64, f64)]) -> KeyedSample {
        pairs.iter().copied().collect()
    }

    #[test]
    fn identical_samples_correlate_fully() {
        let x = sample(&[(46, -12.5), (93, -30.0), (140, -55.25), (187, -20.0)]);
        let result = pearson(&x, &x, 0);

        assert!((result.r - 1.0).abs() < 1e-12);
        assert!((result.determination - 1.0).abs() < 1e-12);
        assert_eq!(result.records, 4);
    }

    #[test]
    fn opposite_trends_correlate_negatively() {
        let x = sample(&[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0), (5, 5.0)]);
        let y = sample(&[(1, 10.0), (2, 8.0), (3, 6.0), (4, 4.0), (5, 2.0)]);
        let result = pearson(&x, &y, 0);

        assert!((result.r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn only_shared_keys_are_compared() {
        let x = sample(&[(46, -10.0), (93, -10.0), (140, -20.0)]);
        let y = sample(&[(93, -30.0), (140, -50.0), (187, -40.0)]);
        let result = pearson(&x, &y, 0);

        assert_eq!(result.records, 2);
        assert!((result.r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_sample_yields_zero() {
        let x = sample(&[(1, -5.0), (2, -5.0), (3, -5.0)]);
        let y = sample(&[(1, -10.0), (2, -20.0), (3, -30.0)]);
        let result = pearson(&x, &y, 0);

        assert_eq!(result.r, 0.0);
        assert_eq!(result.determination, 0.0);
    }

    #[test]
    fn too_few_shared_keys_yields_zero() {
        let x = sample(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let y = sample(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let result = pearson(&x, &y, 5);

        assert_eq!(result.r, 0.0);
        assert_eq!(result.records, 3);
    }

    #[test]
    fn disjoint_samples_yield_zero() {
        let x = sample(&[(1, 1.0), (2, 2.0)]);
        let y = sample(&[(3, 3.0), (4, 4.0)]);
        let result = pearson(&x, &y, 0);

        assert_eq!(result.records, 0);
        assert_eq!(result.r, 0.0);
    }
}
