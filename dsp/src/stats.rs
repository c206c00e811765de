//! Basic descriptive statistics.

/// Arithmetic mean. Returns NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with the n-1 divisor. Returns NaN for fewer than
/// two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let avg = mean(values);
    let sum: f64 = values.iter().map(|v| (v - avg) * (v - avg)).sum();
    sum / (values.len() as f64 - 1.0)
}

/// Sample standard deviation.
pub fn std_deviation(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 5.0);
        assert_eq!(mean(&[3.5]), 3.5);
    }

    #[test]
    fn mean_of_empty_is_nan() {
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn variance_uses_sample_divisor() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = 32.0 / 7.0;
        assert!((sample_variance(&values) - expected).abs() < 1e-12);
        assert!((std_deviation(&values) - expected.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn variance_of_single_value_is_nan() {
        assert!(sample_variance(&[1.0]).is_nan());
        assert!(std_deviation(&[1.0]).is_nan());
    }
}
