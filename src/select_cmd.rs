//! Select command: rank STARIMA orders by final NRMSE.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span};

use strata_starima::{order_grid, select_best_nrmse};

use crate::cli::RunArgs;
use crate::convert;
use crate::input::Inputs;
use crate::report;

#[derive(Debug, Serialize)]
struct SelectReport {
    best: String,
    ranking: Vec<Candidate>,
    skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Candidate {
    order: String,
    p: usize,
    d: usize,
    q: usize,
    final_nrmse: f64,
}

/// Run the order selection grid search.
pub fn run(args: RunArgs) -> Result<()> {
    let _cmd = info_span!("select").entered();
    let inputs = Inputs::load(&args)?;
    let fit_cfg = convert::build_fit_config(&inputs.config.fit)?;
    let train_steps = convert::resolve_train_steps(&inputs.config.fit, inputs.data.n_times())?;
    let train = inputs
        .data
        .slice_rows(0..train_steps)
        .context("failed to slice training rows")?;

    let select = &inputs.config.select;
    let grid = order_grid(select.max_p, inputs.config.model.d, select.max_q);
    info!(n_candidates = grid.len(), "running order selection");
    let selection = select_best_nrmse(&train, &inputs.weights, &grid, &fit_cfg)
        .context("order selection failed")?;
    info!(best = %selection.best().spec(), "order selected");

    let report = SelectReport {
        best: selection.best().spec().to_string(),
        ranking: selection
            .ranking()
            .iter()
            .map(|(spec, nrmse)| Candidate {
                order: spec.to_string(),
                p: spec.p(),
                d: spec.d(),
                q: spec.q(),
                final_nrmse: *nrmse,
            })
            .collect(),
        skipped: selection.skipped().iter().map(ToString::to_string).collect(),
    };
    report::write_report(&inputs.output, &report)
}
