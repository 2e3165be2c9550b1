//! # strata-starima
//!
//! Space-time ARIMA (STARIMA) modelling of a variable observed at many
//! locations: space-time correlograms for order identification, iterative
//! least-squares fitting, and one-step-ahead forecasting.
//!
//! ## Typestate Workflow
//!
//! ```mermaid
//! graph LR
//!     A["StarimaSpec::new(p, d, q)"] -->|".fit(&data, &weights)?"| B["StarimaFit"]
//!     B --> C[".ar() / .ma() coefficients"]
//!     B --> D[".nrmse_trace()"]
//!     B --> E[".forecast(&window, history, horizon)?"]
//!     E --> F["ForecastResult"]
//!     H["select_best_nrmse(&data, &weights, &grid, &config)?"] -->|"grid search"| B
//!     I["stacf / stpacf"] -.->|"identify p, q"| A
//! ```
//!
//! ## Two Usage Paths
//!
//! **Direct fit** (known orders):
//! ```ignore
//! let fit = StarimaSpec::new(2, 12, 1).fit(&data, &weights)?;
//! let forecast = fit.forecast(&window, 48, 12)?;
//! ```
//!
//! **Grid search** (unknown orders):
//! ```ignore
//! let selection = select_best_nrmse(&data, &weights, &order_grid(3, 12, 2), &FitConfig::default())?;
//! ```
//!
//! ## Mathematical Glossary
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | phi_kl | [`StarimaFit::ar()`] | AR coefficient of time lag `k`, spatial order `l` |
//! | theta_kl | [`StarimaFit::ma()`] | MA coefficient of time lag `k`, spatial order `l` |
//! | W(l) | [`strata_space::WeightSet::get()`] | weights of spatial order `l`, `W(0) = I` |
//! | NRMSE | [`StarimaFit::nrmse_trace()`] | RMSE of residuals over the sample sd of the data |
//! | STACF | [`stacf()`] | space-time autocorrelation |
//! | STPACF | [`stpacf()`] | space-time partial autocorrelation |

mod config;
mod correlogram;
mod differencing;
mod error;
mod fit;
mod forecast;
mod selection;
mod spec;

pub(crate) mod design;
pub(crate) mod estimate;
pub(crate) mod lstsq;

pub use config::FitConfig;
pub use correlogram::{SpaceTimeCorrelogram, stacf, stpacf};
pub use differencing::{difference, undifference};
pub use error::{NonConvergenceWarning, StarimaError};
pub use fit::StarimaFit;
pub use forecast::ForecastResult;
pub use selection::{Selection, order_grid, select_best_nrmse};
pub use spec::{StarimaKind, StarimaSpec};
