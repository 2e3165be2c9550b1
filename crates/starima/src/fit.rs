//! Fitted STARIMA model results.

use ndarray::Array2;
use strata_space::{ObservationMatrix, WeightSet};

use crate::error::{NonConvergenceWarning, StarimaError};
use crate::forecast::{self, ForecastResult};
use crate::spec::StarimaSpec;

/// A fitted STARIMA(p,d,q) model produced by [`StarimaSpec::fit()`].
///
/// Holds the AR and MA coefficient arrays (row `k - 1` is time lag `k`,
/// column `l` is spatial order `l`), the residuals on the differenced
/// scale, the cumulative NRMSE trace and the refinement diagnostics. The
/// weight set used for fitting is cloned in so that forecasts use the same
/// spatial structure.
///
/// # Typestate Workflow
///
/// ```mermaid
/// graph LR
///     B["StarimaFit"] --> C[".ar() / .ma() coefficients"]
///     B --> D[".residuals() on the differenced scale"]
///     B --> E[".nrmse_trace()"]
///     B --> F[".non_convergence()"]
///     B --> G[".forecast(&window, history, horizon)"]
/// ```
#[derive(Clone, Debug)]
pub struct StarimaFit {
    spec: StarimaSpec,
    weights: WeightSet,
    locations: Vec<String>,
    ar: Array2<f64>,
    ma: Array2<f64>,
    residuals: Array2<f64>,
    nrmse_trace: Vec<f64>,
    iterations: usize,
    warning: Option<NonConvergenceWarning>,
}

impl StarimaFit {
    /// Creates a new `StarimaFit` (crate-internal constructor).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        spec: StarimaSpec,
        weights: WeightSet,
        locations: Vec<String>,
        ar: Array2<f64>,
        ma: Array2<f64>,
        residuals: Array2<f64>,
        nrmse_trace: Vec<f64>,
        iterations: usize,
        warning: Option<NonConvergenceWarning>,
    ) -> Self {
        Self {
            spec,
            weights,
            locations,
            ar,
            ma,
            residuals,
            nrmse_trace,
            iterations,
            warning,
        }
    }

    /// Returns the [`StarimaSpec`] that produced this fit.
    pub fn spec(&self) -> StarimaSpec {
        self.spec
    }

    /// Returns the `(p, d, q)` order of the fitted model.
    pub fn order(&self) -> (usize, usize, usize) {
        self.spec.order()
    }

    /// AR coefficients, shape `p × S`.
    pub fn ar(&self) -> &Array2<f64> {
        &self.ar
    }

    /// MA coefficients, shape `q × S`.
    pub fn ma(&self) -> &Array2<f64> {
        &self.ma
    }

    /// AR coefficient for time lag `k >= 1` and spatial order `l`.
    pub fn ar_coefficient(&self, k: usize, l: usize) -> Option<f64> {
        k.checked_sub(1).and_then(|r| self.ar.get((r, l)).copied())
    }

    /// MA coefficient for time lag `k >= 1` and spatial order `l`.
    pub fn ma_coefficient(&self, k: usize, l: usize) -> Option<f64> {
        k.checked_sub(1).and_then(|r| self.ma.get((r, l)).copied())
    }

    /// Residuals over the differenced series, `(T - d) × N`. The first
    /// `max(p, q)` rows are zero.
    pub fn residuals(&self) -> &Array2<f64> {
        &self.residuals
    }

    /// Cumulative NRMSE for every usable time step `t >= max(p, q)`.
    pub fn nrmse_trace(&self) -> &[f64] {
        &self.nrmse_trace
    }

    /// NRMSE over the whole usable window (last trace entry).
    pub fn final_nrmse(&self) -> f64 {
        self.nrmse_trace.last().copied().unwrap_or(f64::NAN)
    }

    /// Mean of the finite trace entries, `NaN` if there are none.
    pub fn mean_nrmse(&self) -> f64 {
        let finite: Vec<f64> = self
            .nrmse_trace
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if finite.is_empty() {
            return f64::NAN;
        }
        strata_stats::mean(&finite)
    }

    /// Number of refinement iterations performed (0 for single-pass fits).
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// `true` unless the refinement loop hit its iteration cap.
    pub fn converged(&self) -> bool {
        self.warning.is_none()
    }

    /// The non-convergence warning, if the iteration cap was hit.
    pub fn non_convergence(&self) -> Option<&NonConvergenceWarning> {
        self.warning.as_ref()
    }

    /// The weight set the model was fitted with.
    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    /// Location names in column order.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Number of estimated coefficients, `(p + q) · S`.
    pub fn n_parameters(&self) -> usize {
        self.ar.len() + self.ma.len()
    }

    /// Forecasts rows `history..history + horizon` of `window`.
    ///
    /// The first `history` rows of `window` seed the lags. Each step is
    /// predicted one step ahead: lags use observed values where the window
    /// has them and earlier predictions otherwise. Predictions are returned
    /// on the original (undifferenced) scale, next to whatever observed rows
    /// the window holds for the same steps.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`StarimaError::DimensionMismatch`] | window width differs from the fitted locations |
    /// | [`StarimaError::LocationMismatch`] | window location names or order differ from the fit |
    /// | [`StarimaError::InsufficientData`] | `history < max(p, q) + d` or `history` exceeds the window |
    pub fn forecast(
        &self,
        window: &ObservationMatrix,
        history: usize,
        horizon: usize,
    ) -> Result<ForecastResult, StarimaError> {
        forecast::forecast(self, window, history, horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_fit(trace: Vec<f64>, warning: Option<NonConvergenceWarning>) -> StarimaFit {
        StarimaFit::new(
            StarimaSpec::new(2, 0, 1),
            WeightSet::identity(2),
            vec!["a".into(), "b".into()],
            array![[0.5], [-0.2]],
            array![[0.3]],
            Array2::zeros((4, 2)),
            trace,
            3,
            warning,
        )
    }

    #[test]
    fn fit_accessors_round_trip() {
        let fit = sample_fit(vec![0.9, 0.7, 0.6], None);
        assert_eq!(fit.order(), (2, 0, 1));
        assert_eq!(fit.ar_coefficient(1, 0), Some(0.5));
        assert_eq!(fit.ar_coefficient(2, 0), Some(-0.2));
        assert_eq!(fit.ar_coefficient(0, 0), None);
        assert_eq!(fit.ar_coefficient(3, 0), None);
        assert_eq!(fit.ma_coefficient(1, 0), Some(0.3));
        assert_eq!(fit.ma_coefficient(1, 1), None);
        assert_eq!(fit.n_parameters(), 3);
        assert_eq!(fit.iterations(), 3);
        assert_eq!(fit.locations().len(), 2);
        assert!(fit.converged());
    }

    #[test]
    fn nrmse_summaries() {
        let fit = sample_fit(vec![f64::NAN, 0.8, 0.4], None);
        assert_eq!(fit.final_nrmse(), 0.4);
        assert!((fit.mean_nrmse() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn empty_trace_is_nan() {
        let fit = sample_fit(vec![], None);
        assert!(fit.final_nrmse().is_nan());
        assert!(fit.mean_nrmse().is_nan());
    }

    #[test]
    fn warning_means_not_converged() {
        let w = NonConvergenceWarning {
            iterations: 50,
            change: 1e-3,
            tolerance: 1e-6,
        };
        let fit = sample_fit(vec![0.5], Some(w));
        assert!(!fit.converged());
        assert_eq!(fit.non_convergence(), Some(&w));
    }
}
