//! Diagnose command: correlograms and spatial autocorrelation.

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{info, info_span, warn};

use strata_space::{MoranTest, moran_permutation_test};
use strata_starima::{stacf, stpacf};

use crate::cli::RunArgs;
use crate::convert;
use crate::input::Inputs;
use crate::report;

#[derive(Debug, Serialize)]
struct DiagnoseReport {
    n_times: usize,
    locations: Vec<String>,
    max_lag: usize,
    /// Row `l` is spatial order `l`, column `s - 1` is time lag `s`.
    stacf: Vec<Vec<f64>>,
    stpacf: Vec<Vec<f64>>,
    classical: Vec<LocationCorrelogram>,
    moran: Option<MoranSummary>,
}

#[derive(Debug, Serialize)]
struct LocationCorrelogram {
    location: String,
    acf: Option<Vec<f64>>,
    pacf: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
struct MoranSummary {
    i: f64,
    expected: f64,
    p_value: f64,
    permutations: usize,
}

impl From<MoranTest> for MoranSummary {
    fn from(t: MoranTest) -> Self {
        Self {
            i: t.i,
            expected: t.expected,
            p_value: t.p_value,
            permutations: t.permutations,
        }
    }
}

/// Run the diagnostics pipeline.
pub fn run(args: RunArgs) -> Result<()> {
    let _cmd = info_span!("diagnose").entered();
    let inputs = Inputs::load(&args)?;
    let data = &inputs.data;
    let max_lag = inputs.config.diagnostics.max_lag;

    // 1. Space-time correlograms
    let st_acf = stacf(data, &inputs.weights, max_lag).context("STACF failed")?;
    let st_pacf = stpacf(data, &inputs.weights, max_lag).context("STPACF failed")?;
    info!(n_orders = st_acf.n_orders(), max_lag, "space-time correlograms computed");

    // 2. Per-location classical correlograms
    let classical = data
        .locations()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let series = data.series(i).to_vec();
            LocationCorrelogram {
                location: name.clone(),
                acf: strata_stats::acf(&series, max_lag),
                pacf: strata_stats::pacf(&series, max_lag),
            }
        })
        .collect();

    // 3. Moran's I of location means on first-order neighbours
    let moran = match inputs.weights.get(1) {
        Some(w1) => {
            let mut rng = match inputs.config.seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_os_rng(),
            };
            let means = data.location_means();
            match moran_permutation_test(
                &means,
                w1,
                inputs.config.diagnostics.permutations,
                &mut rng,
            ) {
                Ok(test) => {
                    info!(i = test.i, p_value = test.p_value, "moran's I of location means");
                    Some(MoranSummary::from(test))
                }
                Err(e) => {
                    warn!(error = %e, "moran's I skipped");
                    None
                }
            }
        }
        None => {
            info!("no adjacency: moran's I skipped");
            None
        }
    };

    // 4. Write report
    let report = DiagnoseReport {
        n_times: data.n_times(),
        locations: data.locations().to_vec(),
        max_lag,
        stacf: convert::array_to_rows(st_acf.values()),
        stpacf: convert::array_to_rows(st_pacf.values()),
        classical,
        moran,
    };
    report::write_report(&inputs.output, &report)
}
