//! Iterative least-squares estimation of STARIMA models.
//!
//! The pipeline:
//! 1. Validate configuration, weights and series length
//! 2. Lag-`d` difference the observations
//! 3. Initial pass with zero residuals (AR-only least squares, or the
//!    differenced data itself when `p = 0`)
//! 4. Refine: regress on AR and residual-lag columns, recompute residuals,
//!    repeat until the relative change drops below tolerance or the
//!    iteration cap is hit
//! 5. Cumulative NRMSE trace over the usable time steps
//!
//! **Not part of the public API.**

use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, s};
use strata_space::{ObservationMatrix, WeightSet};
use tracing::{debug, warn};

use crate::config::FitConfig;
use crate::design::{self, LagBlock};
use crate::differencing::difference;
use crate::error::{NonConvergenceWarning, StarimaError};
use crate::fit::StarimaFit;
use crate::lstsq;
use crate::spec::{StarimaKind, StarimaSpec};

/// Fixed inputs shared by every refinement pass.
struct Problem<'a> {
    weights: &'a WeightSet,
    p: usize,
    q: usize,
    start: usize,
    n_times: usize,
    n_locations: usize,
    lagged_z: Vec<Array2<f64>>,
    y: DVector<f64>,
    scale: f64,
}

/// One least-squares pass: the next residual estimate, the coefficients
/// that produced it, and the relative change from the previous estimate.
struct Refinement {
    residuals: Array2<f64>,
    coefficients: DVector<f64>,
    change: f64,
}

impl Problem<'_> {
    fn n_orders(&self) -> usize {
        self.lagged_z.len()
    }

    /// Least squares on the given blocks, returning coefficients and the
    /// unstacked residuals.
    fn solve(
        &self,
        blocks: &[LagBlock<'_>],
    ) -> Result<(DVector<f64>, Array2<f64>), StarimaError> {
        let x: DMatrix<f64> =
            design::design_matrix(blocks, self.start, self.n_times, self.n_locations);

        // MA columns that only reach zero residuals are pinned at zero.
        let n_ar = self.p * self.n_orders();
        let active: Vec<usize> = (0..x.ncols())
            .filter(|&c| c < n_ar || x.column(c).iter().any(|v| *v != 0.0))
            .collect();
        let beta = if active.len() == x.ncols() {
            lstsq::solve(&x, &self.y)?
        } else {
            let reduced = lstsq::solve(&x.select_columns(active.iter()), &self.y)?;
            let mut beta = DVector::zeros(x.ncols());
            for (&c, &b) in active.iter().zip(reduced.iter()) {
                beta[c] = b;
            }
            beta
        };
        let resid = &self.y - &x * &beta;
        Ok((beta, design::unstack(&resid, self.start, self.n_locations)))
    }

    /// Pass with all residuals at zero: the MA block carries no information
    /// and is left out.
    fn initial(&self) -> Result<Refinement, StarimaError> {
        let ar = LagBlock {
            lagged: &self.lagged_z,
            order: self.p,
        };
        let (coefficients, residuals) = self.solve(&[ar])?;
        Ok(Refinement {
            residuals,
            coefficients,
            change: f64::INFINITY,
        })
    }

    /// Pure refinement step: regress on the AR columns plus residual-lag
    /// columns built from `current`.
    fn refine(&self, current: &Array2<f64>) -> Result<Refinement, StarimaError> {
        let lagged_eps = design::spatial_lags(self.weights, current)?;
        let blocks = [
            LagBlock {
                lagged: &self.lagged_z,
                order: self.p,
            },
            LagBlock {
                lagged: &lagged_eps,
                order: self.q,
            },
        ];
        let (coefficients, residuals) = self.solve(&blocks)?;
        let max_diff = residuals
            .iter()
            .zip(current.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        Ok(Refinement {
            residuals,
            coefficients,
            change: max_diff / self.scale,
        })
    }
}

/// Fits a STARIMA model; see [`StarimaSpec::fit_with()`].
#[tracing::instrument(skip(data, weights, config), fields(order = %spec, n_times = data.n_times(), n_locations = data.n_locations()))]
pub(crate) fn fit_starima(
    spec: StarimaSpec,
    data: &ObservationMatrix,
    weights: &WeightSet,
    config: &FitConfig,
) -> Result<StarimaFit, StarimaError> {
    // 1. Validate
    config.validate()?;
    if weights.n_locations() != data.n_locations() {
        return Err(StarimaError::DimensionMismatch {
            name: "weight set locations".into(),
            expected: data.n_locations(),
            got: weights.n_locations(),
        });
    }
    let (p, d, q) = spec.order();
    if data.n_times() < spec.min_time_steps() {
        return Err(StarimaError::InsufficientData {
            available: data.n_times(),
            required: spec.min_time_steps(),
        });
    }

    // 2. Difference
    let z = difference(data.values().view(), d);
    let start = spec.warm_up();
    let (n_times, n_locations) = z.dim();

    let y = design::response(&z, start);
    let rms = (y.norm_squared() / y.len() as f64).sqrt();
    let problem = Problem {
        weights,
        p,
        q,
        start,
        n_times,
        n_locations,
        lagged_z: design::spatial_lags(weights, &z)?,
        y,
        scale: if rms > 0.0 { rms } else { 1.0 },
    };

    // 3. Initial pass
    let mut current = problem.initial()?;
    let mut iterations = 0;
    let mut warning = None;

    // 4. Refinement
    if spec.kind().is_iterative() {
        let tolerance = config.convergence_tolerance();
        let mut converged = false;
        for iteration in 1..=config.max_iterations() {
            let next = problem.refine(&current.residuals)?;
            iterations = iteration;
            debug!(iteration, change = next.change, "residual refinement");
            current = next;
            if current.change < tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            let w = NonConvergenceWarning {
                iterations,
                change: current.change,
                tolerance,
            };
            warn!(order = %spec, "{w}");
            warning = Some(w);
        }
    }

    // 5. Coefficients and NRMSE trace
    let (ar, ma) = split_coefficients(
        &current.coefficients,
        p,
        q,
        problem.n_orders(),
        spec.kind(),
    );
    let trace = nrmse_trace(&z, &current.residuals, start);
    debug!(
        iterations,
        final_nrmse = trace.last().copied().unwrap_or(f64::NAN),
        "fit complete"
    );

    Ok(StarimaFit::new(
        spec,
        weights.clone(),
        data.locations().to_vec(),
        ar,
        ma,
        current.residuals,
        trace,
        iterations,
        warning,
    ))
}

/// Splits the stacked coefficient vector into `p × S` AR and `q × S` MA
/// arrays. A pure-AR or white-noise pass carries no MA coefficients.
fn split_coefficients(
    beta: &DVector<f64>,
    p: usize,
    q: usize,
    n_orders: usize,
    kind: StarimaKind,
) -> (Array2<f64>, Array2<f64>) {
    let n_ar = p * n_orders;
    let ar = Array2::from_shape_fn((p, n_orders), |(k, l)| beta[k * n_orders + l]);
    let ma = if kind.is_iterative() {
        Array2::from_shape_fn((q, n_orders), |(k, l)| beta[n_ar + k * n_orders + l])
    } else {
        Array2::zeros((q, n_orders))
    };
    (ar, ma)
}

/// Cumulative NRMSE over rows `start..=t` for every usable step `t`.
fn nrmse_trace(z: &Array2<f64>, residuals: &Array2<f64>, start: usize) -> Vec<f64> {
    let n_times = z.nrows();
    let mut observed = Vec::with_capacity(z.len());
    let mut errors = Vec::with_capacity(z.len());
    let mut trace = Vec::with_capacity(n_times.saturating_sub(start));
    for t in start..n_times {
        observed.extend(z.slice(s![t, ..]).iter().copied());
        errors.extend(residuals.slice(s![t, ..]).iter().copied());
        trace.push(strata_stats::nrmse(&errors, &observed));
    }
    trace
}
