//! One-step-ahead STARIMA forecasting and forecast error summaries.

use ndarray::{Array1, Array2, ArrayView1, s};
use strata_space::{ObservationMatrix, WeightSet};
use tracing::debug;

use crate::error::StarimaError;
use crate::fit::StarimaFit;

/// Predictions for a forecast horizon, aligned row by row with whatever
/// observations exist for the same time steps.
///
/// `predicted` has one row per horizon step; `observed` covers the first
/// `n_observed() <= horizon()` of those steps.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastResult {
    locations: Vec<String>,
    predicted: Array2<f64>,
    observed: Array2<f64>,
}

impl ForecastResult {
    /// Predicted values on the original scale, `horizon × N`.
    pub fn predicted(&self) -> &Array2<f64> {
        &self.predicted
    }

    /// Observed values for the forecast steps the window covers,
    /// `n_observed × N`.
    pub fn observed(&self) -> &Array2<f64> {
        &self.observed
    }

    /// Location names in column order.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Number of predicted steps.
    pub fn horizon(&self) -> usize {
        self.predicted.nrows()
    }

    /// Number of predicted steps with an observation.
    pub fn n_observed(&self) -> usize {
        self.observed.nrows()
    }

    /// `observed - predicted` for the observed steps.
    pub fn residuals(&self) -> Array2<f64> {
        let n = self.n_observed();
        &self.observed - &self.predicted.slice(s![..n, ..])
    }

    /// Residual vector for one horizon step, `None` past the observed rows.
    pub fn residual(&self, step: usize) -> Option<Array1<f64>> {
        if step >= self.n_observed() {
            return None;
        }
        Some(&self.observed.row(step) - &self.predicted.row(step))
    }

    /// Root mean square forecast error per location over the observed
    /// steps (`NaN` when nothing was observed).
    pub fn location_rmse(&self) -> Vec<f64> {
        if self.n_observed() == 0 {
            return vec![f64::NAN; self.locations.len()];
        }
        self.residuals()
            .columns()
            .into_iter()
            .map(|c| strata_stats::rmse(&c.to_vec()))
            .collect()
    }

    /// Pearson correlation between predicted and observed per location.
    ///
    /// `None` where fewer than three steps were observed or either side is
    /// constant.
    pub fn location_correlation(&self) -> Vec<Option<f64>> {
        let n = self.n_observed();
        (0..self.locations.len())
            .map(|i| {
                let predicted = self.predicted.slice(s![..n, i]).to_vec();
                let observed = self.observed.column(i).to_vec();
                strata_stats::pearson_correlation(&predicted, &observed)
            })
            .collect()
    }

    /// NRMSE pooled over all observed steps and locations.
    pub fn nrmse(&self) -> f64 {
        let residuals: Vec<f64> = self.residuals().iter().copied().collect();
        let observed: Vec<f64> = self.observed.iter().copied().collect();
        strata_stats::nrmse(&residuals, &observed)
    }
}

/// Applies fitted coefficients to lagged differenced values and residuals.
struct Predictor<'a> {
    weights: &'a WeightSet,
    ar: &'a Array2<f64>,
    ma: &'a Array2<f64>,
}

impl Predictor<'_> {
    /// Prediction for differenced row `j`; requires `j >= max(p, q)`.
    fn one_step(
        &self,
        j: usize,
        differenced: &Array2<f64>,
        residuals: &Array2<f64>,
    ) -> Result<Array1<f64>, StarimaError> {
        let mut out = Array1::zeros(differenced.ncols());
        self.accumulate(&mut out, self.ar, j, differenced)?;
        self.accumulate(&mut out, self.ma, j, residuals)?;
        Ok(out)
    }

    fn accumulate(
        &self,
        out: &mut Array1<f64>,
        coefficients: &Array2<f64>,
        j: usize,
        series: &Array2<f64>,
    ) -> Result<(), StarimaError> {
        for ((row, l), &c) in coefficients.indexed_iter() {
            let lagged: ArrayView1<'_, f64> = series.row(j - row - 1);
            out.scaled_add(c, &self.weights.lag_vector(l, lagged)?);
        }
        Ok(())
    }
}

/// Forecasts rows `history..history + horizon` of `window`; see
/// [`StarimaFit::forecast()`].
#[tracing::instrument(skip(fit, window), fields(order = %fit.spec(), n_window = window.n_times()))]
pub(crate) fn forecast(
    fit: &StarimaFit,
    window: &ObservationMatrix,
    history: usize,
    horizon: usize,
) -> Result<ForecastResult, StarimaError> {
    let n_locations = fit.locations().len();
    if window.n_locations() != n_locations {
        return Err(StarimaError::DimensionMismatch {
            name: "window locations".into(),
            expected: n_locations,
            got: window.n_locations(),
        });
    }
    if let Some((column, (expected, got))) = fit
        .locations()
        .iter()
        .zip(window.locations())
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(StarimaError::LocationMismatch {
            column,
            expected: expected.clone(),
            got: got.clone(),
        });
    }
    let spec = fit.spec();
    let d = spec.d();
    let m = spec.warm_up();
    if history < m + d {
        return Err(StarimaError::InsufficientData {
            available: history,
            required: m + d,
        });
    }
    if history > window.n_times() {
        return Err(StarimaError::InsufficientData {
            available: window.n_times(),
            required: history,
        });
    }

    let total = history + horizon;
    let n_known = window.n_times().min(total);

    // Levels: observed where the window has them, predictions afterwards.
    let mut levels = Array2::zeros((total, n_locations));
    levels
        .slice_mut(s![..n_known, ..])
        .assign(&window.values().slice(s![..n_known, ..]));

    let mut differenced = Array2::zeros((total - d, n_locations));
    for j in 0..n_known - d {
        let row = &levels.row(j + d) - &levels.row(j);
        differenced.row_mut(j).assign(&row);
    }
    let mut residuals = Array2::zeros((total - d, n_locations));

    let predictor = Predictor {
        weights: fit.weights(),
        ar: fit.ar(),
        ma: fit.ma(),
    };

    // In-sample residuals over the history.
    for j in m..history - d {
        let pred = predictor.one_step(j, &differenced, &residuals)?;
        let eps = &differenced.row(j) - &pred;
        residuals.row_mut(j).assign(&eps);
    }

    let mut predicted = Array2::zeros((horizon, n_locations));
    for h in 0..horizon {
        let tau = history + h;
        let j = tau - d;
        let pred = predictor.one_step(j, &differenced, &residuals)?;
        let level = if d > 0 {
            &pred + &levels.row(tau - d)
        } else {
            pred.clone()
        };
        predicted.row_mut(h).assign(&level);

        if tau < n_known {
            let eps = &differenced.row(j) - &pred;
            residuals.row_mut(j).assign(&eps);
        } else {
            differenced.row_mut(j).assign(&pred);
            levels.row_mut(tau).assign(&level);
        }
    }

    let observed = window.values().slice(s![history..n_known, ..]).to_owned();
    debug!(horizon, n_observed = observed.nrows(), "forecast complete");

    Ok(ForecastResult {
        locations: fit.locations().to_vec(),
        predicted,
        observed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    use crate::error::NonConvergenceWarning;
    use crate::spec::StarimaSpec;

    fn ar1_fit(phi: f64, d: usize, n_locations: usize) -> StarimaFit {
        StarimaFit::new(
            StarimaSpec::new(1, d, 0),
            WeightSet::identity(n_locations),
            (0..n_locations).map(|i| format!("loc_{i}")).collect(),
            array![[phi]],
            Array2::zeros((0, 1)),
            Array2::zeros((4, n_locations)),
            vec![],
            0,
            None::<NonConvergenceWarning>,
        )
    }

    fn obs(values: Array2<f64>) -> ObservationMatrix {
        ObservationMatrix::from_values(values).unwrap()
    }

    #[test]
    fn one_step_uses_observed_lags() {
        let fit = ar1_fit(0.5, 0, 1);
        let window = obs(array![[2.0], [4.0], [6.0], [8.0]]);
        let result = fit.forecast(&window, 2, 2).unwrap();
        // step 0 predicts row 2 from row 1; step 1 predicts row 3 from row 2
        assert_eq!(result.predicted(), &array![[2.0], [3.0]]);
        assert_eq!(result.observed(), &array![[6.0], [8.0]]);
        assert_eq!(result.residuals(), array![[4.0], [5.0]]);
    }

    #[test]
    fn extrapolation_chains_predictions() {
        let fit = ar1_fit(0.5, 0, 1);
        let window = obs(array![[4.0], [8.0]]);
        let result = fit.forecast(&window, 2, 3).unwrap();
        assert_eq!(result.predicted(), &array![[4.0], [2.0], [1.0]]);
        assert_eq!(result.n_observed(), 0);
        assert!(result.residual(0).is_none());
        assert!(result.nrmse().is_nan());
    }

    #[test]
    fn differenced_predictions_are_integrated() {
        // AR(1) on first differences with phi = 1 continues a linear trend.
        let fit = ar1_fit(1.0, 1, 1);
        let window = obs(array![[1.0], [3.0], [5.0]]);
        let result = fit.forecast(&window, 3, 2).unwrap();
        assert_relative_eq!(result.predicted()[(0, 0)], 7.0, epsilon = 1e-12);
        assert_relative_eq!(result.predicted()[(1, 0)], 9.0, epsilon = 1e-12);
    }

    #[test]
    fn ma_term_uses_history_residuals() {
        let fit = StarimaFit::new(
            StarimaSpec::new(0, 0, 1),
            WeightSet::identity(1),
            vec!["loc_0".into()],
            Array2::zeros((0, 1)),
            array![[0.5]],
            Array2::zeros((3, 1)),
            vec![],
            1,
            None,
        );
        // eps_0 = 0 (warm-up), eps_1 = 2
        // row 2: 0.5 * eps_1 = 1, observed 1 so eps_2 = 0
        // row 3: 0.5 * eps_2 = 0
        let window = obs(array![[5.0], [2.0], [1.0]]);
        let result = fit.forecast(&window, 2, 2).unwrap();
        assert_relative_eq!(result.predicted()[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.predicted()[(1, 0)], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_window_width() {
        let fit = ar1_fit(0.5, 0, 2);
        let window = obs(array![[1.0], [2.0], [3.0]]);
        let err = fit.forecast(&window, 2, 1).unwrap_err();
        assert!(matches!(
            err,
            StarimaError::DimensionMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_reordered_locations() {
        let adjacency = array![[0.0, 1.0], [1.0, 0.0]];
        let fit = StarimaFit::new(
            StarimaSpec::new(1, 0, 0),
            WeightSet::from_adjacency(&adjacency, 1, true).unwrap(),
            vec!["a".into(), "b".into()],
            array![[0.5, 0.2]],
            Array2::zeros((0, 2)),
            Array2::zeros((4, 2)),
            vec![],
            0,
            None,
        );
        let values = array![[1.0, 2.0], [2.0, 3.0], [3.0, 5.0], [4.0, 4.0]];
        let swapped = ObservationMatrix::new(vec!["b".into(), "a".into()], values.clone()).unwrap();
        let err = fit.forecast(&swapped, 3, 1).unwrap_err();
        assert!(matches!(
            err,
            StarimaError::LocationMismatch { column: 0, ref expected, ref got }
                if expected == "a" && got == "b"
        ));

        let renamed = ObservationMatrix::new(vec!["a".into(), "c".into()], values.clone()).unwrap();
        assert!(matches!(
            fit.forecast(&renamed, 3, 1),
            Err(StarimaError::LocationMismatch { column: 1, .. })
        ));

        let aligned = ObservationMatrix::new(vec!["a".into(), "b".into()], values).unwrap();
        assert!(fit.forecast(&aligned, 3, 1).is_ok());
    }

    #[test]
    fn differenced_ma_runs_past_window() {
        let fit = StarimaFit::new(
            StarimaSpec::new(0, 1, 1),
            WeightSet::identity(1),
            vec!["loc_0".into()],
            Array2::zeros((0, 1)),
            array![[0.5]],
            Array2::zeros((3, 1)),
            vec![],
            1,
            None,
        );
        // differences 2, 1, 3; eps_0 = 0 (warm-up), eps_1 = 1 - 0.5 * 0 = 1
        // step 0 (row 3, observed 7): 0.5 * eps_1 = 0.5, level 4.5, eps_2 = 2.5
        // step 1 (row 4): 0.5 * eps_2 = 1.25, level 8.25, eps_3 = 0
        // step 2 (row 5): 0.5 * eps_3 = 0, level stays 8.25
        let window = obs(array![[1.0], [3.0], [4.0], [7.0]]);
        let result = fit.forecast(&window, 3, 3).unwrap();
        assert_eq!(result.horizon(), 3);
        assert_eq!(result.n_observed(), 1);
        assert_relative_eq!(result.predicted()[(0, 0)], 4.5, epsilon = 1e-12);
        assert_relative_eq!(result.predicted()[(1, 0)], 8.25, epsilon = 1e-12);
        assert_relative_eq!(result.predicted()[(2, 0)], 8.25, epsilon = 1e-12);
        assert_relative_eq!(result.residual(0).unwrap()[0], 2.5, epsilon = 1e-12);
        assert!(result.residual(1).is_none());
    }

    #[test]
    fn rejects_short_history() {
        let fit = ar1_fit(0.5, 1, 1);
        let window = obs(array![[1.0], [2.0], [3.0]]);
        let err = fit.forecast(&window, 1, 1).unwrap_err();
        assert!(matches!(
            err,
            StarimaError::InsufficientData {
                available: 1,
                required: 2
            }
        ));
    }

    #[test]
    fn rejects_history_beyond_window() {
        let fit = ar1_fit(0.5, 0, 1);
        let window = obs(array![[1.0], [2.0]]);
        let err = fit.forecast(&window, 3, 1).unwrap_err();
        assert!(matches!(err, StarimaError::InsufficientData { .. }));
    }

    #[test]
    fn summaries_per_location() {
        let result = ForecastResult {
            locations: vec!["a".into(), "b".into()],
            predicted: array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [9.0, 9.0]],
            observed: array![[2.0, 1.0], [4.0, -1.0], [6.0, 1.0]],
        };
        let rmse = result.location_rmse();
        assert_relative_eq!(rmse[0], (14.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(rmse[1], 1.0, epsilon = 1e-12);
        let corr = result.location_correlation();
        assert_relative_eq!(corr[0].unwrap(), 1.0, epsilon = 1e-12);
        assert!(corr[1].is_none());
        assert_eq!(result.residual(1).unwrap(), array![2.0, -1.0]);
        assert!(result.residual(3).is_none());
    }
}
