//! Stacked space-time lag design matrices.
//!
//! Rows are ordered `(t, i)` for time steps `start..n_times` and locations
//! `0..n_locations`. A [`LagBlock`] of order `k_max` contributes one column
//! per `(time lag k, spatial order l)` pair, `k` outer, `l` inner.
//!
//! **Not part of the public API.**

use nalgebra::{DMatrix, DVector};
use ndarray::Array2;
use strata_space::WeightSet;

use crate::error::StarimaError;

/// Spatially lagged copies of one `(time, location)` series, one per
/// spatial order, used up to `order` time lags.
pub(crate) struct LagBlock<'a> {
    pub(crate) lagged: &'a [Array2<f64>],
    pub(crate) order: usize,
}

impl LagBlock<'_> {
    fn n_columns(&self) -> usize {
        self.order * self.lagged.len()
    }
}

/// Spatial lags of `values` at every order of `weights`, order 0 first.
pub(crate) fn spatial_lags(
    weights: &WeightSet,
    values: &Array2<f64>,
) -> Result<Vec<Array2<f64>>, StarimaError> {
    (0..weights.n_orders())
        .map(|l| weights.spatial_lag(l, values.view()).map_err(StarimaError::from))
        .collect()
}

/// Builds the design matrix from `blocks`, rows `start..n_times`.
///
/// Requires `start >= order` for every block so all time lags exist.
pub(crate) fn design_matrix(
    blocks: &[LagBlock<'_>],
    start: usize,
    n_times: usize,
    n_locations: usize,
) -> DMatrix<f64> {
    let n_rows = (n_times - start) * n_locations;
    let n_cols = blocks.iter().map(LagBlock::n_columns).sum();
    let mut x = DMatrix::zeros(n_rows, n_cols);

    let mut col = 0;
    for block in blocks {
        for k in 1..=block.order {
            for lagged in block.lagged {
                for t in start..n_times {
                    for i in 0..n_locations {
                        x[((t - start) * n_locations + i, col)] = lagged[(t - k, i)];
                    }
                }
                col += 1;
            }
        }
    }
    x
}

/// Stacks rows `start..` of `values` into the response vector.
pub(crate) fn response(values: &Array2<f64>, start: usize) -> DVector<f64> {
    let (n_times, n_locations) = values.dim();
    DVector::from_fn((n_times - start) * n_locations, |r, _| {
        values[(start + r / n_locations, r % n_locations)]
    })
}

/// Unstacks a `(t, i)`-ordered vector into a `(time, location)` matrix with
/// `start` leading zero rows.
pub(crate) fn unstack(v: &DVector<f64>, start: usize, n_locations: usize) -> Array2<f64> {
    let n_times = start + v.len() / n_locations;
    Array2::from_shape_fn((n_times, n_locations), |(t, i)| {
        if t < start {
            0.0
        } else {
            v[(t - start) * n_locations + i]
        }
    })
}
