//! Fit command: fit the configured STARIMA model and forecast held-out steps.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span};

use strata_starima::{ForecastResult, StarimaFit};

use crate::cli::RunArgs;
use crate::convert;
use crate::input::Inputs;
use crate::report;

#[derive(Debug, Serialize)]
struct FitReport {
    order: String,
    p: usize,
    d: usize,
    q: usize,
    locations: Vec<String>,
    train_steps: usize,
    /// Row `k - 1` is time lag `k`, column `l` is spatial order `l`.
    ar: Vec<Vec<f64>>,
    ma: Vec<Vec<f64>>,
    iterations: usize,
    converged: bool,
    warning: Option<String>,
    nrmse_trace: Vec<f64>,
    final_nrmse: f64,
    forecast: Option<ForecastReport>,
}

#[derive(Debug, Serialize)]
struct ForecastReport {
    horizon: usize,
    predicted: Vec<Vec<f64>>,
    observed: Vec<Vec<f64>>,
    location_rmse: Vec<f64>,
    location_correlation: Vec<Option<f64>>,
    nrmse: f64,
}

impl From<&ForecastResult> for ForecastReport {
    fn from(f: &ForecastResult) -> Self {
        Self {
            horizon: f.horizon(),
            predicted: convert::array_to_rows(f.predicted()),
            observed: convert::array_to_rows(f.observed()),
            location_rmse: f.location_rmse(),
            location_correlation: f.location_correlation(),
            nrmse: f.nrmse(),
        }
    }
}

fn fit_report(fit: &StarimaFit, train_steps: usize, forecast: Option<ForecastReport>) -> FitReport {
    let (p, d, q) = fit.order();
    FitReport {
        order: fit.spec().to_string(),
        p,
        d,
        q,
        locations: fit.locations().to_vec(),
        train_steps,
        ar: convert::array_to_rows(fit.ar()),
        ma: convert::array_to_rows(fit.ma()),
        iterations: fit.iterations(),
        converged: fit.converged(),
        warning: fit.non_convergence().map(ToString::to_string),
        nrmse_trace: fit.nrmse_trace().to_vec(),
        final_nrmse: fit.final_nrmse(),
        forecast,
    }
}

/// Run the fit-and-forecast pipeline.
pub fn run(args: RunArgs) -> Result<()> {
    let _cmd = info_span!("fit").entered();
    let inputs = Inputs::load(&args)?;
    let spec = convert::build_spec(&inputs.config.model);
    let fit_cfg = convert::build_fit_config(&inputs.config.fit)?;
    let n_times = inputs.data.n_times();
    let train_steps = convert::resolve_train_steps(&inputs.config.fit, n_times)?;

    // 1. Fit on the training rows
    let train = inputs
        .data
        .slice_rows(0..train_steps)
        .context("failed to slice training rows")?;
    info!(order = %spec, train_steps, "fitting model");
    let fit = spec
        .fit_with(&train, &inputs.weights, &fit_cfg)
        .with_context(|| format!("failed to fit {spec}"))?;
    info!(
        iterations = fit.iterations(),
        converged = fit.converged(),
        final_nrmse = fit.final_nrmse(),
        "model fitted"
    );

    // 2. Forecast the held-out rows
    let horizon = n_times - train_steps;
    let forecast = if horizon > 0 {
        let result = fit
            .forecast(&inputs.data, train_steps, horizon)
            .context("forecast failed")?;
        info!(horizon, nrmse = result.nrmse(), "forecast complete");
        Some(ForecastReport::from(&result))
    } else {
        None
    };

    // 3. Write report
    report::write_report(&inputs.output, &fit_report(&fit, train_steps, forecast))
}
