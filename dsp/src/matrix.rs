//! Dense matrix multiply for small coefficient matrices.

/// Multiplies `a` (m x k) by `b` (k x n). Returns None when the inner
/// dimensions disagree or either matrix is empty.
pub fn multiply(a: &[Vec<f64>], b: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let a_cols = a.first()?.len();
    if a_cols != b.len() {
        return None;
    }
    let b_cols = b.first()?.len();

    let mut out = vec![vec![0.0; b_cols]; a.len()];
    for i in 0..a.len() {
        for j in 0..b_cols {
            for k in 0..a_cols {
                out[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_compatible_matrices() {
        let a = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let b = vec![vec![7.0, 8.0], vec![9.0, 10.0], vec![11.0, 12.0]];
        let product = multiply(&a, &b).unwrap();
        assert_eq!(product, vec![vec![58.0, 64.0], vec![139.0, 154.0]]);
    }

    #[test]
    fn identity_leaves_matrix_unchanged() {
        let identity = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let m = vec![vec![3.0, -1.0], vec![2.5, 0.5]];
        assert_eq!(multiply(&identity, &m).unwrap(), m);
    }

    #[test]
    fn dimension_mismatch_is_none() {
        let a = vec![vec![1.0, 2.0]];
        let b = vec![vec![1.0], vec![2.0], vec![3.0]];
        assert!(multiply(&a, &b).is_none());
        assert!(multiply(&[], &b).is_none());
    }
}
