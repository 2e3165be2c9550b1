//! NRMSE-based STARIMA order selection.

use std::cmp::Ordering;

use strata_space::{ObservationMatrix, WeightSet};
use tracing::{debug, warn};

use crate::config::FitConfig;
use crate::error::StarimaError;
use crate::fit::StarimaFit;
use crate::spec::StarimaSpec;

/// Outcome of [`select_best_nrmse`]: the winning fit plus every candidate
/// that fitted, ranked by final NRMSE.
#[derive(Clone, Debug)]
pub struct Selection {
    best: StarimaFit,
    ranking: Vec<(StarimaSpec, f64)>,
    skipped: Vec<StarimaSpec>,
}

impl Selection {
    /// The fit with the lowest final NRMSE.
    pub fn best(&self) -> &StarimaFit {
        &self.best
    }

    /// Consumes the selection, returning the best fit.
    pub fn into_best(self) -> StarimaFit {
        self.best
    }

    /// `(spec, final NRMSE)` for every successful candidate, best first.
    /// `NaN` scores sort last.
    pub fn ranking(&self) -> &[(StarimaSpec, f64)] {
        &self.ranking
    }

    /// Candidates that failed to fit.
    pub fn skipped(&self) -> &[StarimaSpec] {
        &self.skipped
    }
}

/// All `(p, d, q)` with `p <= max_p`, `q <= max_q` and the given `d`, in
/// `p`-major order.
pub fn order_grid(max_p: usize, d: usize, max_q: usize) -> Vec<StarimaSpec> {
    (0..=max_p)
        .flat_map(|p| (0..=max_q).map(move |q| StarimaSpec::new(p, d, q)))
        .collect()
}

fn by_score(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// Fits every candidate and ranks them by final NRMSE.
///
/// Candidates that fail to fit are skipped with a `warn!`. Ties keep the
/// candidate order, so listing simpler models first prefers them.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`StarimaError::InvalidConfig`] | `config` is invalid |
/// | [`StarimaError::AllCandidatesFailed`] | no candidate fitted (including an empty list) |
///
/// # Example
///
/// ```
/// use ndarray::Array2;
/// use strata_space::{ObservationMatrix, WeightSet};
/// use strata_starima::{FitConfig, order_grid, select_best_nrmse};
///
/// let values = Array2::from_shape_fn((24, 2), |(t, i)| ((t * 7 + i * 3) % 5) as f64);
/// let data = ObservationMatrix::from_values(values).unwrap();
/// let selection = select_best_nrmse(
///     &data,
///     &WeightSet::identity(2),
///     &order_grid(1, 0, 1),
///     &FitConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(selection.ranking().len(), 4);
/// ```
#[tracing::instrument(skip(data, weights, candidates, config), fields(n_candidates = candidates.len()))]
pub fn select_best_nrmse(
    data: &ObservationMatrix,
    weights: &WeightSet,
    candidates: &[StarimaSpec],
    config: &FitConfig,
) -> Result<Selection, StarimaError> {
    config.validate()?;

    let mut fits: Vec<StarimaFit> = Vec::with_capacity(candidates.len());
    let mut skipped = Vec::new();
    for spec in candidates {
        match spec.fit_with(data, weights, config) {
            Ok(fit) => {
                debug!(order = %spec, nrmse = fit.final_nrmse(), "candidate fitted");
                fits.push(fit);
            }
            Err(e) => {
                warn!(order = %spec, error = %e, "skipping candidate");
                skipped.push(*spec);
            }
        }
    }

    // stable sort keeps candidate order on ties
    fits.sort_by(|a, b| by_score(a.final_nrmse(), b.final_nrmse()));
    let ranking = fits.iter().map(|f| (f.spec(), f.final_nrmse())).collect();
    let best = fits
        .into_iter()
        .next()
        .ok_or(StarimaError::AllCandidatesFailed {
            candidates: candidates.len(),
        })?;

    Ok(Selection {
        best,
        ranking,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn grid_covers_all_orders() {
        let grid = order_grid(2, 1, 1);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid[0], StarimaSpec::new(0, 1, 0));
        assert_eq!(grid[5], StarimaSpec::new(2, 1, 1));
    }

    #[test]
    fn nan_sorts_last() {
        let mut scores = vec![f64::NAN, 0.5, 0.2, f64::NAN, 0.9];
        scores.sort_by(|a, b| by_score(*a, *b));
        assert_eq!(&scores[..3], &[0.2, 0.5, 0.9]);
        assert!(scores[3].is_nan() && scores[4].is_nan());
    }

    #[test]
    fn too_short_candidates_are_skipped() {
        let values = Array2::from_shape_fn((4, 1), |(t, _)| [1.0, -0.5, 0.8, 0.1][t]);
        let data = ObservationMatrix::from_values(values).unwrap();
        let candidates = [StarimaSpec::new(1, 0, 0), StarimaSpec::new(5, 0, 0)];
        let selection = select_best_nrmse(
            &data,
            &WeightSet::identity(1),
            &candidates,
            &FitConfig::default(),
        )
        .unwrap();
        assert_eq!(selection.ranking().len(), 1);
        assert_eq!(selection.skipped(), &[StarimaSpec::new(5, 0, 0)]);
        assert_eq!(selection.best().spec(), StarimaSpec::new(1, 0, 0));
    }

    #[test]
    fn all_failed() {
        let data = ObservationMatrix::from_values(Array2::ones((3, 1))).unwrap();
        let err = select_best_nrmse(
            &data,
            &WeightSet::identity(1),
            &[StarimaSpec::new(4, 0, 0), StarimaSpec::new(0, 3, 0)],
            &FitConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StarimaError::AllCandidatesFailed { candidates: 2 }
        ));
    }

    #[test]
    fn empty_candidate_list_fails() {
        let data = ObservationMatrix::from_values(Array2::ones((3, 1))).unwrap();
        let err =
            select_best_nrmse(&data, &WeightSet::identity(1), &[], &FitConfig::default())
                .unwrap_err();
        assert!(matches!(
            err,
            StarimaError::AllCandidatesFailed { candidates: 0 }
        ));
    }
}
