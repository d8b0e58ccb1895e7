//! Normality tests for residual series.
//!
//! - Shapiro–Wilk W with Royston's (1995) approximation of the coefficients
//!   and of the null distribution of `ln(1 - W)` (algorithm AS R94), valid
//!   for `3 <= n <= 5000`.
//! - Jarque–Bera, using biased skewness / excess kurtosis and the χ²(2)
//!   asymptotic null distribution.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use crate::error::AppError;
use crate::math::moments::{excess_kurtosis, skewness};

/// A test statistic and its p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestResult {
    fn nan() -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
        }
    }
}

const SMALL: f64 = 1e-19;

// Polynomial coefficients from AS R94.
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// `cc[0] + cc[1]·x + cc[2]·x² + ...`
fn poly(cc: &[f64], x: f64) -> f64 {
    cc.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn std_normal() -> Result<Normal, AppError> {
    Normal::new(0.0, 1.0).map_err(|e| AppError::numeric(format!("Normal distribution error: {e}")))
}

/// Shapiro–Wilk test.
///
/// Errors when `n < 3`. A sample with zero range returns NaN for both W and
/// the p-value.
pub fn shapiro_wilk(sample: &[f64]) -> Result<TestResult, AppError> {
    let n = sample.len();
    if n < 3 {
        return Err(AppError::data(format!(
            "Shapiro-Wilk needs at least 3 observations, got {n}."
        )));
    }
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(AppError::numeric("Shapiro-Wilk sample contains non-finite values."));
    }

    let mut x = sample.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    let range = x[n - 1] - x[0];
    if range < SMALL {
        return Ok(TestResult::nan());
    }

    let norm = std_normal()?;
    let half = swilk_coefficients(n, &norm);

    // W = (Σ a_i (x_(n+1-i) - x_(i)))² / Σ (x - x̄)², computed on x / range.
    let scaled: Vec<f64> = x.iter().map(|v| v / range).collect();
    let mean = scaled.iter().sum::<f64>() / n as f64;
    let ssq: f64 = scaled.iter().map(|v| (v - mean) * (v - mean)).sum();
    let num: f64 = half
        .iter()
        .enumerate()
        .map(|(i, a)| a * (scaled[n - 1 - i] - scaled[i]))
        .sum();
    let w = ((num * num) / ssq).min(1.0);

    let p_value = swilk_p_value(w, n, &norm);
    Ok(TestResult {
        statistic: w,
        p_value,
    })
}

/// The upper half of the antisymmetric coefficient vector (`a_1 >= a_2 >= ...`).
fn swilk_coefficients(n: usize, norm: &Normal) -> Vec<f64> {
    let nn2 = n / 2;
    let mut a = vec![0.0; nn2];
    if n == 3 {
        a[0] = std::f64::consts::FRAC_1_SQRT_2;
        return a;
    }

    let an = n as f64;
    let an25 = an + 0.25;
    // Lower-half expected normal order statistics (negative values).
    let m: Vec<f64> = (1..=nn2)
        .map(|i| norm.inverse_cdf((i as f64 - 0.375) / an25))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let (first_free, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        a[1] = a2;
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    a[0] = a1;
    for i in first_free..nn2 {
        a[i] = -m[i] / fac;
    }
    a
}

fn swilk_p_value(w: f64, n: usize, norm: &Normal) -> f64 {
    if n == 3 {
        const PI6: f64 = 6.0 / std::f64::consts::PI;
        const STQR: f64 = std::f64::consts::FRAC_PI_3;
        let pw = PI6 * (w.sqrt().asin() - STQR);
        return pw.clamp(0.0, 1.0);
    }

    let an = n as f64;
    let mut y = (1.0 - w).ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return SMALL;
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&C5, xx), poly(&C6, xx).exp())
    };

    norm.sf((y - m) / s)
}

/// Jarque–Bera test: `JB = n/6 · (S² + K²/4)`, p from χ²(2).
///
/// A zero-variance sample returns NaN for both fields.
pub fn jarque_bera(sample: &[f64]) -> Result<TestResult, AppError> {
    let n = sample.len();
    if n == 0 {
        return Err(AppError::data("Jarque-Bera needs a non-empty sample."));
    }
    let s = skewness(sample);
    let k = excess_kurtosis(sample);
    if !(s.is_finite() && k.is_finite()) {
        return Ok(TestResult::nan());
    }

    let jb = n as f64 / 6.0 * (s * s + k * k / 4.0);
    let chi2 = ChiSquared::new(2.0).map_err(|e| AppError::numeric(format!("Chi-squared error: {e}")))?;
    Ok(TestResult {
        statistic: jb,
        p_value: chi2.sf(jb),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_scores(n: usize) -> Vec<f64> {
        let norm = Normal::new(0.0, 1.0).unwrap();
        (1..=n)
            .map(|i| norm.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
            .collect()
    }

    #[test]
    fn three_equally_spaced_points_are_perfectly_normal() {
        let r = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert!((r.statistic - 1.0).abs() < 1e-12);
        assert!((r.p_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normal_scores_are_not_rejected() {
        for n in [8, 20, 60] {
            let r = shapiro_wilk(&normal_scores(n)).unwrap();
            assert!(r.statistic > 0.95, "n={n} W={}", r.statistic);
            assert!(r.p_value > 0.5, "n={n} p={}", r.p_value);
        }
    }

    #[test]
    fn heavy_outlier_is_rejected() {
        let mut x = vec![1.0; 9];
        for (i, v) in x.iter_mut().enumerate() {
            *v += i as f64 * 0.01;
        }
        x.push(50.0);
        let r = shapiro_wilk(&x).unwrap();
        assert!(r.statistic < 0.6);
        assert!(r.p_value < 0.001);

        let mut big: Vec<f64> = (0..30).map(|i| (i as f64 * 0.1).exp()).collect();
        big.push(1e4);
        let r = shapiro_wilk(&big).unwrap();
        assert!(r.p_value < 0.001);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(shapiro_wilk(&[1.0, 2.0]).is_err());
        let r = shapiro_wilk(&[4.0; 10]).unwrap();
        assert!(r.statistic.is_nan() && r.p_value.is_nan());
        let jb = jarque_bera(&[4.0; 10]).unwrap();
        assert!(jb.statistic.is_nan() && jb.p_value.is_nan());
    }

    #[test]
    fn jarque_bera_of_uniform_ramp() {
        // S = 0, K = -1.3 -> JB = 5/6 · 1.69/4; χ²(2) sf = exp(-JB/2).
        let r = jarque_bera(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let expected = 5.0 / 6.0 * (1.69 / 4.0);
        assert!((r.statistic - expected).abs() < 1e-12);
        assert!((r.p_value - (-expected / 2.0).exp()).abs() < 1e-9);
    }

    #[test]
    fn poly_is_horner() {
        assert_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 17.0);
    }
}
