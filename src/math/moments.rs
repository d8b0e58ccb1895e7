//! Sample moments, correlation, and covariance.
//!
//! Conventions match the usual "biased" estimators used for residual
//! diagnostics:
//!
//! - standard deviation uses `ddof = 0`
//! - skewness is `m3 / m2^1.5`
//! - kurtosis is the excess form `m4 / m2^2 - 3`
//!
//! A zero-variance sample has no defined shape, so skewness and kurtosis
//! return NaN instead of dividing by zero.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::domain::Correlation;

pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// k-th central moment.
pub fn central_moment(x: &[f64], k: i32) -> f64 {
    let m = mean(x);
    x.iter().map(|v| (v - m).powi(k)).sum::<f64>() / x.len() as f64
}

/// Population standard deviation (`ddof = 0`).
pub fn std_dev(x: &[f64]) -> f64 {
    central_moment(x, 2).sqrt()
}

pub fn skewness(x: &[f64]) -> f64 {
    let m2 = central_moment(x, 2);
    if m2 <= 0.0 {
        return f64::NAN;
    }
    central_moment(x, 3) / m2.powf(1.5)
}

pub fn excess_kurtosis(x: &[f64]) -> f64 {
    let m2 = central_moment(x, 2);
    if m2 <= 0.0 {
        return f64::NAN;
    }
    central_moment(x, 4) / (m2 * m2) - 3.0
}

/// Pearson correlation with a two-sided p-value (t-test on `n - 2` df).
///
/// Returns NaN for both fields when either series has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Correlation {
    let n = x.len().min(y.len());
    if n < 3 {
        return Correlation { r: f64::NAN, p_value: f64::NAN, n };
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return Correlation { r: f64::NAN, p_value: f64::NAN, n };
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    Correlation { r, p_value: correlation_p_value(r, n), n }
}

/// Two-sided p-value for a correlation coefficient under the null `rho = 0`.
pub(crate) fn correlation_p_value(r: f64, n: usize) -> f64 {
    if !r.is_finite() || n < 3 {
        return f64::NAN;
    }
    if (1.0 - r.abs()) <= 0.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / ((1.0 - r) * (1.0 + r))).sqrt();
    two_sided_t(t, df)
}

/// Two-sided Student-t tail probability `P(|T| > |t|)`.
pub(crate) fn two_sided_t(t: f64, df: f64) -> f64 {
    if !t.is_finite() || !(df > 0.0) {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

/// Sample covariance matrix (`ddof = 1`) of equally long series.
///
/// Entry `[i][j]` is the covariance of `series[i]` and `series[j]`.
pub fn covariance_matrix(series: &[&[f64]]) -> Vec<Vec<f64>> {
    let k = series.len();
    let n = series.iter().map(|s| s.len()).min().unwrap_or(0);
    let mut out = vec![vec![f64::NAN; k]; k];
    if n < 2 {
        return out;
    }

    let means: Vec<f64> = series.iter().map(|s| mean(&s[..n])).collect();
    for i in 0..k {
        for j in i..k {
            let c = (0..n)
                .map(|t| (series[i][t] - means[i]) * (series[j][t] - means[j]))
                .sum::<f64>()
                / (n - 1) as f64;
            out[i][j] = c;
            out[j][i] = c;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_of_symmetric_sample() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((std_dev(&x) - 2f64.sqrt()).abs() < 1e-12);
        assert!(skewness(&x).abs() < 1e-12);
        assert!((excess_kurtosis(&x) + 1.3).abs() < 1e-12);
    }

    #[test]
    fn constant_sample_has_nan_shape() {
        let x = [0.5; 12];
        assert_eq!(std_dev(&x), 0.0);
        assert!(skewness(&x).is_nan());
        assert!(excess_kurtosis(&x).is_nan());
    }

    #[test]
    fn pearson_perfect_and_degenerate() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let c = pearson(&x, &y);
        assert!((c.r - 1.0).abs() < 1e-12);
        assert_eq!(c.p_value, 0.0);

        let flat = [3.0; 4];
        assert!(pearson(&x, &flat).r.is_nan());
    }

    #[test]
    fn pearson_p_value_matches_t_test() {
        // r = sqrt(0.6) on 5 points: t = 2.1213 on 3 df, two-sided p ≈ 0.1240.
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let c = pearson(&x, &y);
        assert!((c.r - 0.6f64.sqrt()).abs() < 1e-12);
        assert!((c.p_value - 0.1240).abs() < 1e-3, "p = {}", c.p_value);
    }

    #[test]
    fn covariance_matrix_is_symmetric_with_variances_on_diagonal() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 1.0, 4.0, 3.0];
        let c = [0.0, 0.0, 1.0, 1.0];
        let cov = covariance_matrix(&[&a, &b, &c]);
        assert!((cov[0][0] - 5.0 / 3.0).abs() < 1e-12);
        assert!((cov[0][1] - cov[1][0]).abs() < 1e-15);
        assert!((cov[0][2] - 2.0 / 3.0).abs() < 1e-12);
    }
}
