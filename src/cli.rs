use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Strata space-time ARIMA analysis.
#[derive(Parser)]
#[command(
    name = "strata",
    version,
    about = "Space-time ARIMA analysis of gridded climate data"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Space-time correlograms, classical ACF/PACF and Moran's I.
    Diagnose(RunArgs),
    /// Fit the configured STARIMA model and forecast the held-out steps.
    Fit(RunArgs),
    /// Grid search over (p, q) ranked by final NRMSE.
    Select(RunArgs),
}

/// Arguments shared by every subcommand.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "strata.toml")]
    pub config: PathBuf,

    /// Override input JSON dataset path from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override output JSON report path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override global RNG seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,
}
