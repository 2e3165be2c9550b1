//! Global Moran's I spatial autocorrelation.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::error::SpaceError;
use crate::weights::SpatialWeights;

/// Result of a Moran's I permutation test.
#[derive(Debug, Clone, PartialEq)]
pub struct MoranTest {
    /// Observed statistic.
    pub i: f64,
    /// Expected value under spatial randomness, `-1 / (n - 1)`.
    pub expected: f64,
    /// Pseudo p-value `(extreme + 1) / (permutations + 1)`.
    pub p_value: f64,
    /// Number of random permutations drawn.
    pub permutations: usize,
}

/// Global Moran's I of one value per location.
///
/// `I = (n / S0) · Σ_ij w_ij (x_i - x̄)(x_j - x̄) / Σ_i (x_i - x̄)²`
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`SpaceError::DimensionMismatch`] | `values.len()` differs from the weights |
/// | [`SpaceError::NonFiniteData`] | NaN or infinite value |
/// | [`SpaceError::ZeroWeights`] | all weights are zero |
/// | [`SpaceError::ConstantData`] | all values are identical |
pub fn moran_i(values: &[f64], weights: &SpatialWeights) -> Result<f64, SpaceError> {
    let n = weights.n_locations();
    if values.len() != n {
        return Err(SpaceError::DimensionMismatch {
            name: "moran values".into(),
            expected: n,
            got: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(SpaceError::NonFiniteData {
            input: "moran values",
        });
    }
    let s0 = weights.total();
    if s0 <= 0.0 {
        return Err(SpaceError::ZeroWeights);
    }

    let m = strata_stats::mean(values);
    let z: Vec<f64> = values.iter().map(|v| v - m).collect();
    let denom: f64 = z.iter().map(|d| d * d).sum();
    if denom == 0.0 {
        return Err(SpaceError::ConstantData);
    }

    Ok(statistic(&z, weights, s0, denom))
}

/// Moran's I with a conditional permutation pseudo p-value.
///
/// Values are shuffled across locations `permutations` times; the p-value
/// counts permutations at least as extreme as the observed statistic on the
/// same side of the expectation.
///
/// # Errors
///
/// Same conditions as [`moran_i`].
pub fn moran_permutation_test<R: Rng>(
    values: &[f64],
    weights: &SpatialWeights,
    permutations: usize,
    rng: &mut R,
) -> Result<MoranTest, SpaceError> {
    let observed = moran_i(values, weights)?;
    let n = values.len();
    let expected = if n > 1 { -1.0 / (n as f64 - 1.0) } else { 0.0 };

    let m = strata_stats::mean(values);
    let mut z: Vec<f64> = values.iter().map(|v| v - m).collect();
    let denom: f64 = z.iter().map(|d| d * d).sum();
    let s0 = weights.total();

    let mut extreme = 0usize;
    for _ in 0..permutations {
        z.shuffle(rng);
        let i = statistic(&z, weights, s0, denom);
        let more_extreme = if observed >= expected {
            i >= observed
        } else {
            i <= observed
        };
        if more_extreme {
            extreme += 1;
        }
    }
    let p_value = (extreme + 1) as f64 / (permutations + 1) as f64;
    debug!(i = observed, p_value, permutations, "moran permutation test");

    Ok(MoranTest {
        i: observed,
        expected,
        p_value,
        permutations,
    })
}

fn statistic(z: &[f64], weights: &SpatialWeights, s0: f64, denom: f64) -> f64 {
    let w = weights.matrix();
    let mut cross = 0.0;
    for (i, zi) in z.iter().enumerate() {
        for (j, zj) in z.iter().enumerate() {
            cross += w[(i, j)] * zi * zj;
        }
    }
    (z.len() as f64 / s0) * cross / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn path(n: usize) -> SpatialWeights {
        let adj = Array2::from_shape_fn((n, n), |(i, j)| {
            if i.abs_diff(j) == 1 { 1.0 } else { 0.0 }
        });
        SpatialWeights::new(adj).unwrap()
    }

    #[test]
    fn hand_computed_path() {
        // values 1,2,3 on a path: z = [-1, 0, 1], S0 = 4
        // cross = 2 * (z0*z1 + z1*z2) = 0, so I = 0
        let i = moran_i(&[1.0, 2.0, 3.0], &path(3)).unwrap();
        assert_relative_eq!(i, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn smooth_gradient_is_positive() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let i = moran_i(&values, &path(10)).unwrap();
        assert!(i > 0.5, "expected strong positive autocorrelation, got {i}");
    }

    #[test]
    fn alternating_is_negative() {
        let values: Vec<f64> = (0..10).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let i = moran_i(&values, &path(10)).unwrap();
        assert_relative_eq!(i, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_constant_values() {
        let err = moran_i(&[2.0, 2.0, 2.0], &path(3)).unwrap_err();
        assert!(matches!(err, SpaceError::ConstantData));
    }

    #[test]
    fn rejects_zero_weights() {
        let w = SpatialWeights::new(Array2::zeros((3, 3))).unwrap();
        let err = moran_i(&[1.0, 2.0, 3.0], &w).unwrap_err();
        assert!(matches!(err, SpaceError::ZeroWeights));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = moran_i(&[1.0, 2.0], &path(3)).unwrap_err();
        assert!(matches!(err, SpaceError::DimensionMismatch { .. }));
    }

    #[test]
    fn permutation_test_flags_gradient() {
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let test = moran_permutation_test(&values, &path(12), 199, &mut rng).unwrap();
        assert_relative_eq!(test.expected, -1.0 / 11.0, epsilon = 1e-12);
        assert!(test.p_value < 0.05, "p = {}", test.p_value);
        assert_eq!(test.permutations, 199);
    }

    #[test]
    fn permutation_test_deterministic_with_seed() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let w = path(8);
        let a = moran_permutation_test(&values, &w, 99, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = moran_permutation_test(&values, &w, 99, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_permutations_gives_unit_p_value() {
        let w = array![[0.0, 1.0], [1.0, 0.0]];
        let w = SpatialWeights::new(w).unwrap();
        let test = moran_permutation_test(&[1.0, 2.0], &w, 0, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(test.p_value, 1.0);
    }
}
