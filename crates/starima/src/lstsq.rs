//! SVD-based ordinary least squares.
//!
//! **Not part of the public API.**

use nalgebra::{DMatrix, DVector};

use crate::error::StarimaError;

/// Solves `min ||x·β - y||²` through the singular value decomposition.
///
/// Singular values at or below `max(rows, cols) · ε · σ_max` are treated as
/// zero (the LAPACK `gelsd` default). Any such value makes the design
/// rank-deficient and the solve fails with [`StarimaError::SingularDesign`];
/// no regularisation is applied.
pub(crate) fn solve(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>, StarimaError> {
    let (rows, cols) = x.shape();
    if cols == 0 {
        return Ok(DVector::zeros(0));
    }
    if rows < cols {
        return Err(StarimaError::SingularDesign {
            rank: rows,
            columns: cols,
        });
    }

    let svd = x.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    let threshold = rows.max(cols) as f64 * f64::EPSILON * sigma_max;
    let rank = svd
        .singular_values
        .iter()
        .filter(|&&s| s > threshold)
        .count();
    if rank < cols {
        return Err(StarimaError::SingularDesign {
            rank,
            columns: cols,
        });
    }

    svd.solve(y, threshold)
        .map_err(|_| StarimaError::SingularDesign {
            rank,
            columns: cols,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exact_line() {
        // y = 2 a - b
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0]);
        let y = DVector::from_vec(vec![2.0, -1.0, 1.0, 3.0]);
        let beta = solve(&x, &y).unwrap();
        assert_relative_eq!(beta[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(beta[1], -1.0, epsilon = 1e-10);
    }

    #[test]
    fn overdetermined_mean() {
        // single constant column: beta = mean(y)
        let x = DMatrix::from_element(3, 1, 1.0);
        let y = DVector::from_vec(vec![1.0, 2.0, 6.0]);
        let beta = solve(&x, &y).unwrap();
        assert_relative_eq!(beta[0], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn no_columns() {
        let x = DMatrix::zeros(3, 0);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(solve(&x, &y).unwrap().len(), 0);
    }

    #[test]
    fn collinear_columns_fail() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let err = solve(&x, &y).unwrap_err();
        assert!(matches!(
            err,
            StarimaError::SingularDesign {
                rank: 1,
                columns: 2
            }
        ));
    }

    #[test]
    fn zero_column_fails() {
        let x = DMatrix::zeros(4, 1);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(
            solve(&x, &y),
            Err(StarimaError::SingularDesign { rank: 0, .. })
        ));
    }

    #[test]
    fn underdetermined_fails() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let y = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            solve(&x, &y),
            Err(StarimaError::SingularDesign { .. })
        ));
    }
}
