//! STARIMA model specification (unfitted).

use strata_space::{ObservationMatrix, WeightSet};

use crate::config::FitConfig;
use crate::error::StarimaError;
use crate::fit::StarimaFit;

/// Which parts of the model are active, derived from the orders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StarimaKind {
    /// `p = 0, q = 0`: no regressors, residuals are the (differenced) data.
    WhiteNoise,
    /// `q = 0`: single closed-form least-squares pass.
    PureAr,
    /// `p = 0`: moving-average terms only, refined iteratively.
    PureMa,
    /// `p > 0, q > 0`: autoregressive and moving-average terms.
    Mixed,
}

impl StarimaKind {
    /// Whether the fit needs iterative residual refinement.
    pub fn is_iterative(self) -> bool {
        matches!(self, Self::PureMa | Self::Mixed)
    }
}

/// An unfitted STARIMA(p,d,q) specification.
///
/// Entry point of the typestate workflow: build a spec with
/// [`StarimaSpec::new()`], then call [`StarimaSpec::fit()`] to obtain a
/// [`StarimaFit`].
///
/// ```mermaid
/// graph LR
///     A["StarimaSpec::new(p, d, q)"] -->|".fit(&data, &weights)?"| B["StarimaFit"]
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StarimaSpec {
    p: usize,
    d: usize,
    q: usize,
}

impl StarimaSpec {
    /// Creates a STARIMA(p,d,q) spec: AR order `p`, differencing lag `d`
    /// (0 = none), MA order `q`.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_starima::{StarimaKind, StarimaSpec};
    ///
    /// let spec = StarimaSpec::new(2, 12, 1);
    /// assert_eq!(spec.order(), (2, 12, 1));
    /// assert_eq!(spec.kind(), StarimaKind::Mixed);
    /// assert_eq!(spec.warm_up(), 2);
    /// ```
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Returns the AR order (`p`).
    pub fn p(&self) -> usize {
        self.p
    }

    /// Returns the differencing lag (`d`).
    pub fn d(&self) -> usize {
        self.d
    }

    /// Returns the MA order (`q`).
    pub fn q(&self) -> usize {
        self.q
    }

    /// Returns `(p, d, q)`.
    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    /// Number of leading differenced steps without a full lag history,
    /// `max(p, q)`.
    pub fn warm_up(&self) -> usize {
        self.p.max(self.q)
    }

    /// Minimum number of time steps a series needs for this spec.
    pub fn min_time_steps(&self) -> usize {
        self.warm_up() + self.d + 1
    }

    /// Classifies the spec by which orders are zero.
    pub fn kind(&self) -> StarimaKind {
        match (self.p, self.q) {
            (0, 0) => StarimaKind::WhiteNoise,
            (_, 0) => StarimaKind::PureAr,
            (0, _) => StarimaKind::PureMa,
            _ => StarimaKind::Mixed,
        }
    }

    /// Fits this spec with the default [`FitConfig`].
    ///
    /// # Errors
    ///
    /// See [`StarimaSpec::fit_with()`].
    pub fn fit(
        &self,
        data: &ObservationMatrix,
        weights: &WeightSet,
    ) -> Result<StarimaFit, StarimaError> {
        self.fit_with(data, weights, &FitConfig::default())
    }

    /// Fits this spec by iterative least squares.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`StarimaError::InvalidConfig`] | `config` fails validation |
    /// | [`StarimaError::DimensionMismatch`] | weights cover a different number of locations |
    /// | [`StarimaError::InsufficientData`] | `n_times - d <= max(p, q)` |
    /// | [`StarimaError::SingularDesign`] | rank-deficient design matrix |
    pub fn fit_with(
        &self,
        data: &ObservationMatrix,
        weights: &WeightSet,
        config: &FitConfig,
    ) -> Result<StarimaFit, StarimaError> {
        crate::estimate::fit_starima(*self, data, weights, config)
    }
}

impl std::fmt::Display for StarimaSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "STARIMA({},{},{})", self.p, self.d, self.q)
    }
}
