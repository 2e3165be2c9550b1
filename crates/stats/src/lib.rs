//! Statistical helper functions for the strata workspace.
//!
//! Scalar summaries (mean, variance, RMSE/NRMSE), Pearson correlation and
//! the classical sample ACF/PACF that the space-time correlograms reduce to
//! when no spatial structure is present.

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Sample variance with N-1 denominator (matching R's `var()`).
/// Returns 0.0 if fewer than 2 elements.
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = data.iter().sum::<f64>() / nf;
    data.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / (nf - 1.0)
}

/// Sample standard deviation with N-1 denominator (matching R's `sd()`).
/// Returns 0.0 if fewer than 2 elements.
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Root mean square of a residual slice. Returns 0.0 if empty.
pub fn rmse(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    let ss: f64 = residuals.iter().map(|r| r * r).sum();
    (ss / residuals.len() as f64).sqrt()
}

/// Normalised RMSE: `rmse(residuals) / sd(observed)`.
///
/// Returns `NaN` when `observed` has zero (or undefined) spread, so callers
/// comparing traces never mistake a degenerate window for a perfect fit.
pub fn nrmse(residuals: &[f64], observed: &[f64]) -> f64 {
    let spread = sd(observed);
    if spread <= 0.0 || !spread.is_finite() {
        return f64::NAN;
    }
    rmse(residuals) / spread
}

/// Pearson correlation coefficient.
///
/// Filters to indices where both `x[i]` and `y[i]` are finite.
/// Returns `None` if fewer than 3 finite pairs or if the denominator is zero
/// (constant input).
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(xi, yi)| (*xi, *yi))
        .collect();

    if pairs.len() < 3 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx: f64 = pairs.iter().map(|(xi, _)| xi).sum::<f64>() / n;
    let my: f64 = pairs.iter().map(|(_, yi)| yi).sum::<f64>() / n;

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for &(xi, yi) in &pairs {
        let dx = xi - mx;
        let dy = yi - my;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }

    let denom = (sum_xx * sum_yy).sqrt();
    if denom == 0.0 {
        return None;
    }

    Some(sum_xy / denom)
}

/// Sample autocorrelation at lags `1..=max_lag`.
///
/// Uses the standard biased estimator
/// `r_k = Σ_{t=k}^{n-1} (x_t - x̄)(x_{t-k} - x̄) / Σ_t (x_t - x̄)²`.
///
/// Returns `None` if `data.len() <= max_lag` or the series is constant.
pub fn acf(data: &[f64], max_lag: usize) -> Option<Vec<f64>> {
    let n = data.len();
    if n <= max_lag {
        return None;
    }
    let m = mean(data);
    let centred: Vec<f64> = data.iter().map(|x| x - m).collect();
    let c0: f64 = centred.iter().map(|x| x * x).sum();
    if c0 == 0.0 {
        return None;
    }

    let r = (1..=max_lag)
        .map(|k| {
            let ck: f64 = centred[k..]
                .iter()
                .zip(&centred[..n - k])
                .map(|(a, b)| a * b)
                .sum();
            ck / c0
        })
        .collect();
    Some(r)
}

/// Partial autocorrelations from autocorrelations `rho[0] = r_1, rho[1] = r_2, ...`
/// via the Durbin-Levinson recursion.
///
/// The output has the same length as `rho`. Once the recursion hits a zero
/// prediction-error variance, the remaining entries are `NaN`.
pub fn pacf_from_acf(rho: &[f64]) -> Vec<f64> {
    let p = rho.len();
    let mut out = Vec::with_capacity(p);
    if p == 0 {
        return out;
    }

    let mut phi = vec![0.0; p];
    let mut prev = vec![0.0; p];

    phi[0] = rho[0];
    out.push(rho[0]);

    for k in 1..p {
        prev[..k].copy_from_slice(&phi[..k]);

        let num: f64 = rho[k] - (0..k).map(|j| prev[j] * rho[k - 1 - j]).sum::<f64>();
        let den: f64 = 1.0 - (0..k).map(|j| prev[j] * rho[j]).sum::<f64>();
        if den == 0.0 {
            out.resize(p, f64::NAN);
            return out;
        }
        let phi_kk = num / den;

        phi[k] = phi_kk;
        for j in 0..k {
            phi[j] = prev[j] - phi_kk * prev[k - 1 - j];
        }
        out.push(phi_kk);
    }

    out
}

/// Sample partial autocorrelation at lags `1..=max_lag` (Yule-Walker /
/// Durbin-Levinson on [`acf`]).
///
/// Returns `None` under the same conditions as [`acf`].
pub fn pacf(data: &[f64], max_lag: usize) -> Option<Vec<f64>> {
    acf(data, max_lag).map(|rho| pacf_from_acf(&rho))
}
