//! Space-time autocorrelation (STACF) and partial autocorrelation (STPACF).
//!
//! Both are computed on per-location centred observations, for every
//! spatial order of a [`WeightSet`] (order 0 being the identity) and time
//! lags `1..=max_lag`. With an identity-only weight set they reduce to the
//! classical (pooled) ACF and PACF.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, ArrayView1, Axis};
use strata_space::{ObservationMatrix, WeightSet};
use tracing::debug;

use crate::error::StarimaError;

/// Correlogram values, one row per spatial order and one column per time
/// lag `1..=max_lag`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpaceTimeCorrelogram {
    values: Array2<f64>,
}

impl SpaceTimeCorrelogram {
    /// Number of spatial orders, including order 0.
    pub fn n_orders(&self) -> usize {
        self.values.nrows()
    }

    /// Largest time lag.
    pub fn max_lag(&self) -> usize {
        self.values.ncols()
    }

    /// `S × L` values; column `s - 1` is time lag `s`.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// All lags of one spatial order.
    pub fn order(&self, l: usize) -> Option<ArrayView1<'_, f64>> {
        (l < self.n_orders()).then(|| self.values.row(l))
    }

    /// Value at spatial order `l` and time lag `s >= 1`.
    pub fn get(&self, l: usize, s: usize) -> Option<f64> {
        s.checked_sub(1).and_then(|c| self.values.get((l, c)).copied())
    }
}

/// Centred data and its spatial lags, shared by both correlograms.
struct Lagged {
    centred: Array2<f64>,
    lags: Vec<Array2<f64>>,
}

fn prepare(
    data: &ObservationMatrix,
    weights: &WeightSet,
    max_lag: usize,
) -> Result<Lagged, StarimaError> {
    if weights.n_locations() != data.n_locations() {
        return Err(StarimaError::DimensionMismatch {
            name: "weight set locations".into(),
            expected: data.n_locations(),
            got: weights.n_locations(),
        });
    }
    if max_lag == 0 {
        return Err(StarimaError::InvalidConfig {
            reason: "max_lag must be at least 1".into(),
        });
    }
    if max_lag >= data.n_times() {
        return Err(StarimaError::InsufficientData {
            available: data.n_times(),
            required: max_lag + 1,
        });
    }

    let values = data.values();
    let means = values.mean_axis(Axis(0)).ok_or(StarimaError::ConstantData)?;
    let centred = values - &means;
    if centred.iter().all(|v| *v == 0.0) {
        return Err(StarimaError::ConstantData);
    }
    let lags = (0..weights.n_orders())
        .map(|l| weights.spatial_lag(l, centred.view()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Lagged { centred, lags })
}

/// `Σ_{t=h}^{T-1} a_{t-h} · b_t` summed over locations.
fn cross_product(a: &Array2<f64>, b: &Array2<f64>, h: usize) -> f64 {
    let n = a.nrows();
    (h..n).map(|t| a.row(t - h).dot(&b.row(t))).sum()
}

fn stacf_values(lagged: &Lagged, max_lag: usize) -> Array2<f64> {
    let z = &lagged.centred;
    let zz = cross_product(z, z, 0);
    let mut out = Array2::zeros((lagged.lags.len(), max_lag));
    for (l, wz) in lagged.lags.iter().enumerate() {
        let ww = cross_product(wz, wz, 0);
        let denom = (ww * zz).sqrt();
        for s in 1..=max_lag {
            out[(l, s - 1)] = if denom > 0.0 {
                cross_product(wz, z, s) / denom
            } else {
                f64::NAN
            };
        }
    }
    out
}

/// Space-time autocorrelation function.
///
/// `STACF(l, s) = Σ_t (W_l z_{t-s})·z_t / sqrt(Σ_t |W_l z_t|² · Σ_t |z_t|²)`
///
/// A spatial order whose lagged series is identically zero (no neighbours)
/// yields a row of `NaN`.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`StarimaError::DimensionMismatch`] | weight set built for a different number of locations |
/// | [`StarimaError::InvalidConfig`] | `max_lag == 0` |
/// | [`StarimaError::InsufficientData`] | `max_lag >= n_times` |
/// | [`StarimaError::ConstantData`] | every location series is constant |
#[tracing::instrument(skip(data, weights), fields(n_times = data.n_times(), n_orders = weights.n_orders()))]
pub fn stacf(
    data: &ObservationMatrix,
    weights: &WeightSet,
    max_lag: usize,
) -> Result<SpaceTimeCorrelogram, StarimaError> {
    let lagged = prepare(data, weights, max_lag)?;
    let values = stacf_values(&lagged, max_lag);
    debug!("stacf computed");
    Ok(SpaceTimeCorrelogram { values })
}

/// Space-time partial autocorrelation function.
///
/// For every spatial order `l` and lag `s`, solves the `s × s` Toeplitz
/// system `R φ = r` with `R_ij = γ_l(|i - j|) / γ_l(0)` (autocorrelations of
/// the spatially lagged series) and `r_i = STACF(l, i)`, and reports `φ_s`.
/// Singular systems yield `NaN`.
///
/// # Errors
///
/// Same conditions as [`stacf`].
#[tracing::instrument(skip(data, weights), fields(n_times = data.n_times(), n_orders = weights.n_orders()))]
pub fn stpacf(
    data: &ObservationMatrix,
    weights: &WeightSet,
    max_lag: usize,
) -> Result<SpaceTimeCorrelogram, StarimaError> {
    let lagged = prepare(data, weights, max_lag)?;
    let acf = stacf_values(&lagged, max_lag);

    let mut out = Array2::from_elem((lagged.lags.len(), max_lag), f64::NAN);
    for (l, wz) in lagged.lags.iter().enumerate() {
        let gamma: Vec<f64> = (0..max_lag).map(|h| cross_product(wz, wz, h)).collect();
        if gamma[0] <= 0.0 {
            continue;
        }
        for s in 1..=max_lag {
            let r = DMatrix::from_fn(s, s, |i, j| gamma[i.abs_diff(j)] / gamma[0]);
            let rhs = DVector::from_fn(s, |i, _| acf[(l, i)]);
            if let Some(phi) = r.lu().solve(&rhs) {
                out[(l, s - 1)] = phi[s - 1];
            }
        }
    }
    debug!("stpacf computed");
    Ok(SpaceTimeCorrelogram { values: out })
}
