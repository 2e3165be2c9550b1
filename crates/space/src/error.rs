//! Error types for the strata-space crate.

/// Error type for all fallible operations in the strata-space crate.
///
/// Covers shape validation of observation matrices and spatial weights,
/// as well as degenerate inputs to the spatial autocorrelation statistics.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpaceError {
    /// Returned when a matrix has no time steps or no locations.
    #[error("input data is empty")]
    EmptyData,

    /// Returned when an input contains NaN or infinity.
    #[error("non-finite value in {input}")]
    NonFiniteData {
        /// Name of the input containing the non-finite value.
        input: &'static str,
    },

    /// Returned when two inputs disagree on a dimension.
    #[error("dimension mismatch for {name}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// What was being compared.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when a weight or adjacency matrix is not square.
    #[error("weight matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Returned when a weight matrix contains a negative entry.
    #[error("negative weight {value} at ({row}, {col})")]
    NegativeWeight {
        /// Row index of the offending entry.
        row: usize,
        /// Column index of the offending entry.
        col: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when a spatial lag order is not present in a weight set.
    #[error("spatial order {order} out of range (max {max})")]
    InvalidOrder {
        /// Requested spatial order.
        order: usize,
        /// Highest order available.
        max: usize,
    },

    /// Returned when two locations share the same name.
    #[error("duplicate location name '{name}'")]
    DuplicateLocation {
        /// The repeated name.
        name: String,
    },

    /// Returned when a weight matrix sums to zero.
    #[error("weight matrix has no non-zero entries")]
    ZeroWeights,

    /// Returned when the values have zero variance.
    #[error("input data is constant (zero variance)")]
    ConstantData,
}
