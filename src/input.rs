//! JSON dataset reader.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use strata_space::{ObservationMatrix, WeightSet};

use crate::cli::RunArgs;
use crate::config::StrataConfig;
use crate::convert;

/// A space-time dataset: one value per location and time step, plus an
/// optional location adjacency matrix.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    /// Location names in column order.
    pub locations: Vec<String>,
    /// Rows are time steps, columns follow `locations`.
    pub values: Vec<Vec<f64>>,
    /// Square adjacency; positive entries mark neighbours.
    #[serde(default)]
    pub adjacency: Option<Vec<Vec<f64>>>,
}

/// Reads a [`Dataset`] from a JSON file.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse dataset JSON: {}", path.display()))
}

/// Everything a subcommand needs: parsed config, observations, weights and
/// the resolved report path.
pub struct Inputs {
    pub config: StrataConfig,
    pub data: ObservationMatrix,
    pub weights: WeightSet,
    pub output: PathBuf,
}

impl Inputs {
    /// Loads the config, applies CLI overrides and reads the dataset.
    pub fn load(args: &RunArgs) -> Result<Self> {
        let mut config = StrataConfig::load(&args.config)?;
        if args.seed.is_some() {
            config.seed = args.seed;
        }
        let input = config.input_path(args.input.as_deref())?;
        let output = config.output_path(args.output.as_deref())?;

        info!(path = %input.display(), "reading dataset");
        let dataset = read_dataset(&input)?;
        let data = convert::build_observations(&dataset)?;
        let weights = convert::build_weight_set(&dataset, &config.weights)?;
        info!(
            n_times = data.n_times(),
            n_locations = data.n_locations(),
            max_order = weights.max_order(),
            "dataset loaded"
        );

        Ok(Self {
            config,
            data,
            weights,
            output,
        })
    }
}
