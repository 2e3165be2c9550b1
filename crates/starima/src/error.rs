//! Error types for the strata-starima crate.

use std::fmt;

use strata_space::SpaceError;

/// Error type for all fallible operations in the strata-starima crate.
///
/// Every variant is fatal: no partial result is returned. Hitting the
/// refinement cap is not an error, see [`NonConvergenceWarning`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum StarimaError {
    /// Returned when there are too few time steps for the requested order.
    #[error("insufficient data: got {available} time steps, need at least {required}")]
    InsufficientData {
        /// Number of time steps provided.
        available: usize,
        /// Minimum number of time steps required.
        required: usize,
    },

    /// Returned when the least-squares design matrix is rank-deficient.
    #[error("singular design matrix: rank {rank} < {columns} columns")]
    SingularDesign {
        /// Numerical rank of the design.
        rank: usize,
        /// Number of design columns.
        columns: usize,
    },

    /// Returned when the weights or a forecast window do not match the
    /// location count of the data.
    #[error("dimension mismatch for {name}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// What was being compared.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when a forecast window lists its locations in a different
    /// order (or under different names) than the fitted model.
    #[error("location mismatch at column {column}: expected '{expected}', got '{got}'")]
    LocationMismatch {
        /// First column whose name differs.
        column: usize,
        /// Name the model was fitted with.
        expected: String,
        /// Name found in the window.
        got: String,
    },

    /// Returned when the centred data is identically zero.
    #[error("input data is constant (zero variance)")]
    ConstantData,

    /// Returned when a configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Returned when every order-selection candidate failed to fit.
    #[error("all {candidates} STARIMA candidates failed")]
    AllCandidatesFailed {
        /// Number of candidates attempted.
        candidates: usize,
    },

    /// Propagated validation failure from the spatial layer.
    #[error(transparent)]
    Space(#[from] SpaceError),
}

/// Non-fatal report attached to a fit whose residual refinement hit the
/// iteration cap before stabilising.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonConvergenceWarning {
    /// Refinement passes performed (equals the configured cap).
    pub iterations: usize,
    /// Relative residual change of the last pass.
    pub change: f64,
    /// Configured convergence tolerance.
    pub tolerance: f64,
}

impl fmt::Display for NonConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "residuals did not stabilise after {} iterations (change {:.3e} > tolerance {:.3e})",
            self.iterations, self.change, self.tolerance
        )
    }
}
