//! Simple (one-regressor) linear regression.
//!
//! Fits `y = intercept + slope · x` by least squares and reports the
//! correlation coefficient, the two-sided p-value for `slope = 0` (t-test on
//! `n - 2` degrees of freedom), and standard errors of both coefficients.
//!
//! When `x` has zero variance the slope is not identified. Instead of failing,
//! the fit is marked `degenerate` with `slope = 0`, `intercept = ȳ`, `r = 0`
//! and NaN inference, so that downstream residuals are `y - ȳ`.

use crate::domain::SimpleFit;
use crate::error::AppError;
use crate::math::moments::{mean, two_sided_t};

const TINY: f64 = 1e-20;

pub fn linregress(x: &[f64], y: &[f64]) -> Result<SimpleFit, AppError> {
    if x.len() != y.len() {
        return Err(AppError::data(format!(
            "Regression inputs differ in length ({} vs {}).",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(AppError::data(format!("Regression needs at least 2 observations, got {n}.")));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(AppError::numeric("Regression inputs contain non-finite values."));
    }

    let ymean = mean(y);

    // Checked on raw values; the mean of a constant is not always exact.
    let (xmin, xmax) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if xmin == xmax {
        return Ok(SimpleFit {
            slope: 0.0,
            intercept: ymean,
            r_value: 0.0,
            r_squared: 0.0,
            p_value: f64::NAN,
            slope_stderr: f64::NAN,
            intercept_stderr: f64::NAN,
            n,
            degenerate: true,
        });
    }

    let xmean = mean(x);

    let mut ssxm = 0.0;
    let mut ssym = 0.0;
    let mut ssxym = 0.0;
    for (a, b) in x.iter().zip(y) {
        ssxm += (a - xmean) * (a - xmean);
        ssym += (b - ymean) * (b - ymean);
        ssxym += (a - xmean) * (b - ymean);
    }
    let ssxm = ssxm / n as f64;
    let ssym = ssym / n as f64;
    let ssxym = ssxym / n as f64;

    let r_den = (ssxm * ssym).sqrt();
    let r = if r_den == 0.0 {
        0.0
    } else {
        (ssxym / r_den).clamp(-1.0, 1.0)
    };

    let slope = ssxym / ssxm;
    let intercept = ymean - slope * xmean;

    let (p_value, slope_stderr, intercept_stderr) = if n == 2 {
        // Two points: a perfect line with no residual degrees of freedom.
        (if r == 0.0 { 1.0 } else { 0.0 }, 0.0, 0.0)
    } else {
        let df = (n - 2) as f64;
        let t = r * (df / ((1.0 - r + TINY) * (1.0 + r + TINY))).sqrt();
        let slope_stderr = ((1.0 - r * r) * ssym / ssxm / df).sqrt();
        let intercept_stderr = slope_stderr * (ssxm + xmean * xmean).sqrt();
        (two_sided_t(t, df), slope_stderr, intercept_stderr)
    };

    Ok(SimpleFit {
        slope,
        intercept,
        r_value: r,
        r_squared: r * r,
        p_value,
        slope_stderr,
        intercept_stderr,
        n,
        degenerate: false,
    })
}

impl SimpleFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// `y_i - (intercept + slope · x_i)` for each observation.
    pub fn residuals(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        x.iter().zip(y).map(|(&a, &b)| b - self.predict(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textbook_example() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let fit = linregress(&x, &y).unwrap();

        assert!((fit.slope - 0.6).abs() < 1e-12);
        assert!((fit.intercept - 2.2).abs() < 1e-12);
        assert!((fit.r_squared - 0.6).abs() < 1e-12);
        assert!((fit.slope_stderr - 0.08f64.sqrt()).abs() < 1e-12);
        assert!((fit.intercept_stderr - 0.88f64.sqrt()).abs() < 1e-12);
        assert!((fit.p_value - 0.1240).abs() < 1e-3);
        assert!(!fit.degenerate);

        let res = fit.residuals(&x, &y);
        let expected = [-0.8, 0.6, 1.0, -0.6, -0.2];
        for (a, b) in res.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_target_has_zero_slope_and_unit_p() {
        let x = [0.01, 0.02, 0.03, 0.04];
        let y = [0.5; 4];
        let fit = linregress(&x, &y).unwrap();
        assert_eq!(fit.r_value, 0.0);
        assert!(fit.slope.abs() < 1e-12);
        assert!((fit.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_regressor_is_degenerate() {
        let fit = linregress(&[2.0; 5], &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(fit.degenerate);
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!(fit.p_value.is_nan());
    }

    #[test]
    fn constant_regressor_with_inexact_mean_is_degenerate() {
        let noise: Vec<f64> = (0..27).map(|i| (i as f64 * 1.7).sin()).collect();
        for x in [vec![0.1; 10], vec![0.1; 9], vec![0.07; 10], vec![20f64.ln(); 27]] {
            let y = &noise[..x.len()];
            let fit = linregress(&x, y).unwrap();
            assert!(fit.degenerate, "x = {:?}", x[0]);
            assert_eq!(fit.slope, 0.0);
            assert!((fit.intercept - mean(y)).abs() < 1e-15);
        }
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(linregress(&[1.0, 2.0], &[1.0]).is_err());
        assert!(linregress(&[1.0], &[1.0]).is_err());
        assert!(linregress(&[1.0, f64::NAN], &[1.0, 2.0]).is_err());
    }
}
