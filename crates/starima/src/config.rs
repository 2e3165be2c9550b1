//! Configuration for the residual refinement loop.

use crate::error::StarimaError;

/// Stopping rules for STARIMA fitting.
///
/// # Example
///
/// ```
/// use strata_starima::FitConfig;
///
/// let config = FitConfig::default()
///     .with_max_iterations(200)
///     .with_convergence_tolerance(1e-8);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_iterations(), 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    max_iterations: usize,
    convergence_tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            convergence_tolerance: 1e-6,
        }
    }
}

impl FitConfig {
    /// Sets the upper bound on residual refinement passes.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the relative residual-change stopping threshold.
    pub fn with_convergence_tolerance(mut self, tolerance: f64) -> Self {
        self.convergence_tolerance = tolerance;
        self
    }

    /// Returns the refinement cap.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Returns the convergence tolerance.
    pub fn convergence_tolerance(&self) -> f64 {
        self.convergence_tolerance
    }

    /// Validates this configuration.
    ///
    /// Returns an error if `max_iterations < 1` or the tolerance is
    /// non-finite / non-positive.
    pub fn validate(&self) -> Result<(), StarimaError> {
        if self.max_iterations < 1 {
            return Err(StarimaError::InvalidConfig {
                reason: format!("max_iterations must be >= 1, got {}", self.max_iterations),
            });
        }
        if !self.convergence_tolerance.is_finite() || self.convergence_tolerance <= 0.0 {
            return Err(StarimaError::InvalidConfig {
                reason: format!(
                    "convergence_tolerance must be finite and positive, got {}",
                    self.convergence_tolerance
                ),
            });
        }
        Ok(())
    }
}
