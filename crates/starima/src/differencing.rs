//! Lag-`d` differencing along the time axis and its inverse.

use ndarray::{Array2, ArrayView2, s};

use crate::error::StarimaError;

/// Lag-`lag` difference of every column: `out[t] = x[t + lag] - x[t]`.
///
/// The result has `nrows - lag` rows (zero rows if `lag >= nrows`). A lag of
/// zero returns a copy.
pub fn difference(values: ArrayView2<'_, f64>, lag: usize) -> Array2<f64> {
    if lag == 0 {
        return values.to_owned();
    }
    let n = values.nrows();
    if lag >= n {
        return Array2::zeros((0, values.ncols()));
    }
    &values.slice(s![lag.., ..]) - &values.slice(s![..n - lag, ..])
}

/// Inverts [`difference`]: cumulatively re-adds the lag-`d` history given the
/// first `d` rows of the original series (`d = initial.nrows()`).
///
/// # Errors
///
/// Returns [`StarimaError::DimensionMismatch`] if the column counts differ.
pub fn undifference(
    differenced: ArrayView2<'_, f64>,
    initial: ArrayView2<'_, f64>,
) -> Result<Array2<f64>, StarimaError> {
    if differenced.ncols() != initial.ncols() {
        return Err(StarimaError::DimensionMismatch {
            name: "initial rows".into(),
            expected: differenced.ncols(),
            got: initial.ncols(),
        });
    }
    let lag = initial.nrows();
    if lag == 0 {
        return Ok(differenced.to_owned());
    }

    let n = lag + differenced.nrows();
    let mut out = Array2::zeros((n, initial.ncols()));
    out.slice_mut(s![..lag, ..]).assign(&initial);
    for t in lag..n {
        let next = &out.row(t - lag) + &differenced.row(t - lag);
        out.row_mut(t).assign(&next);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn lag_one() {
        let x = array![[1.0, 10.0], [3.0, 7.0], [6.0, 7.5]];
        assert_eq!(
            difference(x.view(), 1),
            array![[2.0, -3.0], [3.0, 0.5]]
        );
    }

    #[test]
    fn seasonal_lag() {
        let x = array![[1.0], [2.0], [3.0], [5.0], [8.0]];
        assert_eq!(difference(x.view(), 3), array![[4.0], [6.0]]);
    }

    #[test]
    fn lag_zero_is_copy() {
        let x = array![[1.0, 2.0]];
        assert_eq!(difference(x.view(), 0), x);
    }

    #[test]
    fn lag_too_long_is_empty() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(difference(x.view(), 2).dim(), (0, 2));
    }

    #[test]
    fn round_trip_reconstructs() {
        let x = array![
            [1.5, -2.0],
            [2.25, 0.0],
            [0.5, 4.0],
            [7.0, 3.5],
            [6.0, -1.0],
            [9.5, 2.0]
        ];
        for lag in 1..=3 {
            let dx = difference(x.view(), lag);
            let back = undifference(dx.view(), x.slice(s![..lag, ..])).unwrap();
            assert_eq!(back.dim(), x.dim());
            for (a, b) in back.iter().zip(x.iter()) {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn undifference_rejects_column_mismatch() {
        let dx = array![[1.0, 2.0]];
        let init = array![[0.0]];
        assert!(matches!(
            undifference(dx.view(), init.view()),
            Err(StarimaError::DimensionMismatch { .. })
        ));
    }
}
