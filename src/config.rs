use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// Top-level Strata configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StrataConfig {
    /// Global RNG seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// I/O settings.
    #[serde(default)]
    pub io: IoConfig,

    /// Spatial weight settings.
    #[serde(default)]
    pub weights: WeightsToml,

    /// STARIMA order.
    #[serde(default)]
    pub model: ModelToml,

    /// Fitting settings.
    #[serde(default)]
    pub fit: FitToml,

    /// Diagnostics settings.
    #[serde(default)]
    pub diagnostics: DiagnosticsToml,

    /// Order selection settings.
    #[serde(default)]
    pub select: SelectToml,
}

impl StrataConfig {
    /// Reads and parses a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&toml_str).context("failed to parse TOML config")
    }

    /// Dataset path: the CLI override, else `[io].input`.
    pub fn input_path(&self, cli: Option<&Path>) -> Result<PathBuf> {
        cli.map(Path::to_path_buf)
            .or_else(|| self.io.input.clone())
            .ok_or_else(|| anyhow!("no input path: set [io].input in config or use --input"))
    }

    /// Report path: the CLI override, else `[io].output`.
    pub fn output_path(&self, cli: Option<&Path>) -> Result<PathBuf> {
        cli.map(Path::to_path_buf)
            .or_else(|| self.io.output.clone())
            .ok_or_else(|| anyhow!("no output path: set [io].output in config or use --output"))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct IoConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightsToml {
    #[serde(default = "default_max_order")]
    pub max_order: usize,
    #[serde(default = "default_true")]
    pub row_normalise: bool,
}

impl Default for WeightsToml {
    fn default() -> Self {
        Self {
            max_order: default_max_order(),
            row_normalise: true,
        }
    }
}

fn default_max_order() -> usize {
    1
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    #[serde(default = "default_p")]
    pub p: usize,
    #[serde(default)]
    pub d: usize,
    #[serde(default)]
    pub q: usize,
}

impl Default for ModelToml {
    fn default() -> Self {
        Self {
            p: default_p(),
            d: 0,
            q: 0,
        }
    }
}

fn default_p() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitToml {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_convergence_tolerance")]
    pub convergence_tolerance: f64,
    /// Leading time steps used for fitting; the rest is forecast. All rows
    /// when unset.
    #[serde(default)]
    pub train_steps: Option<usize>,
}

impl Default for FitToml {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            convergence_tolerance: default_convergence_tolerance(),
            train_steps: None,
        }
    }
}

fn default_max_iterations() -> usize {
    50
}
fn default_convergence_tolerance() -> f64 {
    1e-6
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsToml {
    #[serde(default = "default_max_lag")]
    pub max_lag: usize,
    #[serde(default = "default_permutations")]
    pub permutations: usize,
}

impl Default for DiagnosticsToml {
    fn default() -> Self {
        Self {
            max_lag: default_max_lag(),
            permutations: default_permutations(),
        }
    }
}

fn default_max_lag() -> usize {
    12
}
fn default_permutations() -> usize {
    999
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectToml {
    #[serde(default = "default_max_p")]
    pub max_p: usize,
    #[serde(default = "default_max_q")]
    pub max_q: usize,
}

impl Default for SelectToml {
    fn default() -> Self {
        Self {
            max_p: default_max_p(),
            max_q: default_max_q(),
        }
    }
}

fn default_max_p() -> usize {
    3
}
fn default_max_q() -> usize {
    2
}
