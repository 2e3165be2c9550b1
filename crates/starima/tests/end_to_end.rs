//! End-to-end recovery tests for strata-starima on synthetic space-time data.

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use strata_space::{ObservationMatrix, WeightSet};
use strata_starima::{FitConfig, StarimaSpec, order_grid, select_best_nrmse};

/// `z_t = phi0 · z_{t-1} + phi1 · W z_{t-1} + e_t` with `e ~ N(0, 1)`.
fn generate_star1(
    start: &[f64],
    phi0: f64,
    phi1: f64,
    weights: &WeightSet,
    n: usize,
    seed: u64,
) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let n_loc = start.len();
    let mut z = Array2::zeros((n, n_loc));
    for (i, v) in start.iter().enumerate() {
        z[(0, i)] = *v;
    }
    for t in 1..n {
        let prev = z.row(t - 1).to_owned();
        let lagged = if phi1 != 0.0 {
            weights.lag_vector(1, prev.view()).unwrap()
        } else {
            Array1::zeros(n_loc)
        };
        for i in 0..n_loc {
            z[(t, i)] = phi0 * prev[i] + phi1 * lagged[i] + normal.sample(&mut rng);
        }
    }
    z
}

fn ring(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(i, j)| {
        if (i + 1) % n == j || (j + 1) % n == i {
            1.0
        } else {
            0.0
        }
    })
}

#[test]
fn ar1_recovery_three_locations() {
    let weights = WeightSet::identity(3);
    let z = generate_star1(&[20.0, -15.0, 12.0], 0.9, 0.0, &weights, 36, 2024);
    let data = ObservationMatrix::from_values(z).unwrap();

    let fit = StarimaSpec::new(1, 0, 0).fit(&data, &weights).unwrap();
    let phi = fit.ar()[(0, 0)];
    assert!((phi - 0.9).abs() < 0.1, "phi: expected ~0.9, got {phi}");
    assert!(
        fit.final_nrmse() < 0.5,
        "final NRMSE too high: {}",
        fit.final_nrmse()
    );
    assert_eq!(fit.nrmse_trace().len(), 35);
    assert!(fit.converged());
}

#[test]
fn spatial_coefficient_recovery() {
    let weights = WeightSet::from_adjacency(&ring(6), 1, true).unwrap();
    let start = [3.0, -2.0, 1.0, 4.0, -3.0, 0.5];
    let z = generate_star1(&start, 0.5, 0.3, &weights, 300, 7);
    let data = ObservationMatrix::from_values(z).unwrap();

    let fit = StarimaSpec::new(1, 0, 0).fit(&data, &weights).unwrap();
    let phi0 = fit.ar_coefficient(1, 0).unwrap();
    let phi1 = fit.ar_coefficient(1, 1).unwrap();
    assert!((phi0 - 0.5).abs() < 0.1, "phi_10: expected ~0.5, got {phi0}");
    assert!((phi1 - 0.3).abs() < 0.1, "phi_11: expected ~0.3, got {phi1}");
}

#[test]
fn ma1_recovery() {
    let theta = 0.5;
    let mut rng = StdRng::seed_from_u64(99);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let n = 400;
    let eps: Vec<f64> = (0..n * 3).map(|_| normal.sample(&mut rng)).collect();
    let z = Array2::from_shape_fn((n, 3), |(t, i)| {
        let e = |t: usize| eps[t * 3 + i];
        e(t) + if t > 0 { theta * e(t - 1) } else { 0.0 }
    });
    let data = ObservationMatrix::from_values(z).unwrap();

    let config = FitConfig::default().with_max_iterations(200);
    let fit = StarimaSpec::new(0, 0, 1)
        .fit_with(&data, &WeightSet::identity(3), &config)
        .unwrap();
    let estimate = fit.ma()[(0, 0)];
    assert!(
        (estimate - theta).abs() < 0.15,
        "theta: expected ~{theta}, got {estimate}"
    );
    assert!(fit.iterations() >= 1);
}

#[test]
fn fit_then_forecast_holdout() {
    let weights = WeightSet::identity(3);
    let z = generate_star1(&[20.0, -15.0, 12.0], 0.9, 0.0, &weights, 48, 11);
    let data = ObservationMatrix::from_values(z).unwrap();
    let train = data.slice_rows(0..36).unwrap();

    let fit = StarimaSpec::new(1, 0, 0).fit(&train, &weights).unwrap();
    let forecast = fit.forecast(&data, 36, 12).unwrap();
    assert_eq!(forecast.horizon(), 12);
    assert_eq!(forecast.n_observed(), 12);
    assert_eq!(forecast.predicted().dim(), (12, 3));
    assert_eq!(forecast.location_rmse().len(), 3);

    // one-step predictions from observed lags
    let phi = fit.ar()[(0, 0)];
    for i in 0..3 {
        let expected = phi * data.values()[(40, i)];
        assert!((forecast.predicted()[(5, i)] - expected).abs() < 1e-10);
    }
}

#[test]
fn grid_search_prefers_true_order() {
    let weights = WeightSet::identity(3);
    let z = generate_star1(&[20.0, -15.0, 12.0], 0.9, 0.0, &weights, 60, 5);
    let data = ObservationMatrix::from_values(z).unwrap();

    let selection =
        select_best_nrmse(&data, &weights, &order_grid(1, 0, 1), &FitConfig::default()).unwrap();
    assert_eq!(selection.ranking().len(), 4);
    // white noise is by far the worst model for a persistent AR(1)
    let (worst, _) = selection.ranking()[3];
    assert_eq!(worst, StarimaSpec::new(0, 0, 0));
    assert!(selection.best().spec().p() == 1);
}
