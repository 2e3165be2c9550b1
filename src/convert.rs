//! Pure conversion functions: TOML config and JSON dataset -> crate API types.

use anyhow::{Context, Result, bail};
use ndarray::Array2;

use strata_space::{ObservationMatrix, WeightSet};
use strata_starima::{FitConfig, StarimaSpec};

use crate::config::{FitToml, ModelToml, WeightsToml};
use crate::input::Dataset;

/// Converts nested rows into a dense matrix, rejecting ragged input.
pub fn rows_to_array(rows: &[Vec<f64>], what: &str) -> Result<Array2<f64>> {
    let n_cols = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        bail!(
            "{what}: row {i} has {} entries, expected {n_cols}",
            row.len()
        );
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), n_cols), flat)
        .with_context(|| format!("{what}: invalid shape"))
}

/// Converts a matrix back into nested rows for JSON output.
pub fn array_to_rows(values: &Array2<f64>) -> Vec<Vec<f64>> {
    values.rows().into_iter().map(|r| r.to_vec()).collect()
}

/// Builds an [`ObservationMatrix`] from the dataset values.
pub fn build_observations(dataset: &Dataset) -> Result<ObservationMatrix> {
    let values = rows_to_array(&dataset.values, "values")?;
    ObservationMatrix::new(dataset.locations.clone(), values)
        .context("invalid observation matrix")
}

/// Builds a [`WeightSet`] from the dataset adjacency and the TOML weight
/// settings. Without an adjacency only the identity order is available.
pub fn build_weight_set(dataset: &Dataset, weights: &WeightsToml) -> Result<WeightSet> {
    match &dataset.adjacency {
        Some(rows) => {
            let adjacency = rows_to_array(rows, "adjacency")?;
            WeightSet::from_adjacency(&adjacency, weights.max_order, weights.row_normalise)
                .context("invalid adjacency matrix")
        }
        None => Ok(WeightSet::identity(dataset.locations.len())),
    }
}

/// Builds a [`StarimaSpec`] from the TOML model order.
pub fn build_spec(model: &ModelToml) -> StarimaSpec {
    StarimaSpec::new(model.p, model.d, model.q)
}

/// Builds and validates a [`FitConfig`] from the TOML fit configuration.
pub fn build_fit_config(fit: &FitToml) -> Result<FitConfig> {
    let cfg = FitConfig::default()
        .with_max_iterations(fit.max_iterations)
        .with_convergence_tolerance(fit.convergence_tolerance);
    cfg.validate().context("invalid [fit] configuration")?;
    Ok(cfg)
}

/// Resolves the training length: `train_steps` if set, otherwise all rows.
pub fn resolve_train_steps(fit: &FitToml, n_times: usize) -> Result<usize> {
    match fit.train_steps {
        None => Ok(n_times),
        Some(0) => bail!("train_steps must be at least 1"),
        Some(n) if n > n_times => {
            bail!("train_steps ({n}) exceeds the {n_times} time steps in the dataset")
        }
        Some(n) => Ok(n),
    }
}
