//! Sample autocorrelation function.
//!
//! `acf_k = Σ_t (x_t - x̄)(x_{t+k} - x̄) / Σ_t (x_t - x̄)²`
//!
//! The denominator is the full-sample sum of squares for every lag (the
//! non-adjusted estimator), so `|acf_k| <= 1` always holds.

use crate::math::moments::mean;

/// Number of lags summed by the residual diagnostics.
pub const DIAGNOSTIC_LAGS: usize = 5;

/// Autocorrelations for lags `0..=max_lag`.
///
/// Lags beyond `n - 1` cannot be estimated and are not returned, so the
/// output may be shorter than `max_lag + 1`. A zero-variance series yields
/// NaN for every lag.
pub fn acf(x: &[f64], max_lag: usize) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let max_lag = max_lag.min(n - 1);
    let m = mean(x);
    let dev: Vec<f64> = x.iter().map(|v| v - m).collect();
    let denom: f64 = dev.iter().map(|d| d * d).sum();

    (0..=max_lag)
        .map(|lag| {
            if denom <= 0.0 {
                return f64::NAN;
            }
            let num: f64 = dev[lag..].iter().zip(&dev[..n - lag]).map(|(a, b)| a * b).sum();
            num / denom
        })
        .collect()
}

/// Sum of absolute autocorrelations over lags `1..=lags`.
pub fn acf_abs_sum(x: &[f64], lags: usize) -> f64 {
    acf(x, lags).iter().skip(1).map(|v| v.abs()).sum()
}

/// Default lag count for ACF plots: `min(⌈10·log10 n⌉, ⌊n / 2⌋)`, at least 1.
pub fn default_plot_lags(n: usize) -> usize {
    if n < 2 {
        return 0;
    }
    let by_log = (10.0 * (n as f64).log10()).ceil() as usize;
    by_log.min(n / 2).max(1)
}

/// Bartlett 95% band half-width for each lag `1..=acf.len()-1`.
///
/// `1.96 · sqrt((1 + 2 Σ_{j<k} acf_j²) / n)`
pub fn bartlett_band(acf_values: &[f64], n: usize) -> Vec<f64> {
    const Z_975: f64 = 1.959963984540054;
    if n == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(acf_values.len().saturating_sub(1));
    let mut cum = 0.0;
    for k in 1..acf_values.len() {
        if k > 1 {
            cum += acf_values[k - 1] * acf_values[k - 1];
        }
        out.push(Z_975 * ((1.0 + 2.0 * cum) / n as f64).sqrt());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acf_of_linear_ramp() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let r = acf(&x, 5);
        assert_eq!(r.len(), 5);
        assert!((r[0] - 1.0).abs() < 1e-12);
        assert!((r[1] - 0.4).abs() < 1e-12);
        assert!((r[2] + 0.1).abs() < 1e-12);
        assert!((r[3] + 0.4).abs() < 1e-12);
        assert!((r[4] + 0.4).abs() < 1e-12);
        assert!((acf_abs_sum(&x, DIAGNOSTIC_LAGS) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn constant_series_is_nan() {
        let r = acf(&[2.0; 8], 3);
        assert!(r.iter().all(|v| v.is_nan()));
        assert!(acf_abs_sum(&[2.0; 8], 3).is_nan());
    }

    #[test]
    fn plot_lags_follow_log_rule() {
        assert_eq!(default_plot_lags(200), 24);
        assert_eq!(default_plot_lags(100), 20);
        assert_eq!(default_plot_lags(26), 13);
        assert_eq!(default_plot_lags(25), 12);
        assert_eq!(default_plot_lags(10), 5);
        assert_eq!(default_plot_lags(5), 2);
        assert_eq!(default_plot_lags(3), 1);
    }

    #[test]
    fn bartlett_band_widens_with_lag() {
        let r = [1.0, 0.5, 0.2, 0.1];
        let band = bartlett_band(&r, 100);
        assert_eq!(band.len(), 3);
        assert!((band[0] - 0.196).abs() < 1e-3);
        assert!(band[1] > band[0]);
        assert!(band[2] > band[1]);
    }
}
