//! Multivariate ordinary least squares with regression inference.
//!
//! We solve
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! through the SVD pseudo-inverse of the design matrix rather than the normal
//! equations:
//!
//! - rank-deficient designs (collinear columns) still return the minimum-norm
//!   least-squares solution instead of failing; the fit records `rank < k`
//! - the unscaled covariance `(XᵀX)⁺ = X⁺ X⁺ᵀ` falls out of the same factorization
//!
//! The design matrices here are tiny (≈20 rows, 2–3 columns), so SVD cost is
//! irrelevant.
//!
//! R² is centered when the design carries a constant column and uncentered
//! otherwise.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use crate::domain::{Coefficient, OlsFit};
use crate::error::AppError;
use crate::math::moments::two_sided_t;

/// A named regressor column.
#[derive(Debug, Clone)]
pub struct DesignColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl DesignColumn {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A column of ones with `n` rows.
    pub fn constant(name: impl Into<String>, n: usize) -> Self {
        Self::new(name, vec![1.0; n])
    }

    fn is_constant(&self) -> bool {
        match self.values.first() {
            Some(&first) => first != 0.0 && self.values.iter().all(|&v| v == first),
            None => false,
        }
    }
}

/// Fit output: summary statistics plus the residual series.
#[derive(Debug, Clone)]
pub struct OlsOutput {
    pub fit: OlsFit,
    pub residuals: Vec<f64>,
}

/// Fit `y` on the given columns.
pub fn fit_ols(y: &[f64], columns: &[DesignColumn]) -> Result<OlsOutput, AppError> {
    let n = y.len();
    let k = columns.len();
    if n == 0 || k == 0 {
        return Err(AppError::data("OLS needs at least one observation and one regressor."));
    }
    if let Some(bad) = columns.iter().find(|c| c.values.len() != n) {
        return Err(AppError::data(format!(
            "OLS column `{}` has {} rows, expected {n}.",
            bad.name,
            bad.values.len()
        )));
    }
    if y.iter().chain(columns.iter().flat_map(|c| c.values.iter())).any(|v| !v.is_finite()) {
        return Err(AppError::numeric("OLS inputs contain non-finite values."));
    }

    let x = DMatrix::from_fn(n, k, |i, j| columns[j].values[i]);
    let yv = DVector::from_column_slice(y);

    let svd = x.clone().svd(true, true);
    let sv_max = svd.singular_values.max();
    let sv_min = svd.singular_values.min();
    let tol = sv_max * (n.max(k) as f64) * f64::EPSILON;
    let rank = svd.rank(tol);
    let condition_number = if sv_min > 0.0 { sv_max / sv_min } else { f64::INFINITY };

    let pinv = svd
        .pseudo_inverse(tol)
        .map_err(|e| AppError::numeric(format!("OLS pseudo-inverse failed: {e}")))?;
    let beta = &pinv * &yv;
    if beta.iter().any(|v| !v.is_finite()) {
        return Err(AppError::numeric("OLS produced non-finite coefficients."));
    }
    let cov_unscaled = &pinv * pinv.transpose();

    let fitted = &x * &beta;
    let residuals: Vec<f64> = yv.iter().zip(fitted.iter()).map(|(a, b)| a - b).collect();
    let ssr: f64 = residuals.iter().map(|e| e * e).sum();

    let has_constant = columns.iter().any(DesignColumn::is_constant);
    let k_constant = usize::from(has_constant);
    let ymean = y.iter().sum::<f64>() / n as f64;
    let tss: f64 = if has_constant {
        y.iter().map(|v| (v - ymean) * (v - ymean)).sum()
    } else {
        y.iter().map(|v| v * v).sum()
    };

    let df_model = rank.saturating_sub(k_constant);
    let df_resid = n.saturating_sub(rank);

    let r_squared = if tss > 0.0 { 1.0 - ssr / tss } else { f64::NAN };
    let adj_r_squared = if df_resid > 0 {
        1.0 - (n - k_constant) as f64 / df_resid as f64 * (1.0 - r_squared)
    } else {
        f64::NAN
    };

    let scale = if df_resid > 0 { ssr / df_resid as f64 } else { f64::NAN };

    let (f_value, f_p_value) = if df_model > 0 && df_resid > 0 {
        let f = ((tss - ssr) / df_model as f64) / scale;
        let p = FisherSnedecor::new(df_model as f64, df_resid as f64)
            .map(|d| if f.is_finite() { d.sf(f) } else { 0.0 })
            .unwrap_or(f64::NAN);
        (f, p)
    } else {
        (f64::NAN, f64::NAN)
    };

    let t_crit = if df_resid > 0 {
        StudentsT::new(0.0, 1.0, df_resid as f64)
            .map(|d| d.inverse_cdf(0.975))
            .unwrap_or(f64::NAN)
    } else {
        f64::NAN
    };

    let coefficients = columns
        .iter()
        .enumerate()
        .map(|(j, col)| {
            let estimate = beta[j];
            let std_error = (scale * cov_unscaled[(j, j)]).sqrt();
            let t_value = estimate / std_error;
            Coefficient {
                name: col.name.clone(),
                estimate,
                std_error,
                t_value,
                p_value: two_sided_t(t_value, df_resid as f64),
                ci_lower: estimate - t_crit * std_error,
                ci_upper: estimate + t_crit * std_error,
            }
        })
        .collect();

    let nf = n as f64;
    let log_likelihood = -nf / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (ssr / nf).ln() + 1.0);
    let n_params = (df_model + k_constant) as f64;
    let aic = -2.0 * log_likelihood + 2.0 * n_params;
    let bic = -2.0 * log_likelihood + nf.ln() * n_params;

    let durbin_watson = if ssr > 0.0 {
        residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum::<f64>() / ssr
    } else {
        f64::NAN
    };

    Ok(OlsOutput {
        fit: OlsFit {
            coefficients,
            n,
            rank,
            df_model,
            df_resid,
            has_constant,
            r_squared,
            adj_r_squared,
            f_value,
            f_p_value,
            log_likelihood,
            aic,
            bic,
            durbin_watson,
            condition_number,
        },
        residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_simple_regression_inference() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let out = fit_ols(&y, &[DesignColumn::constant("const", 5), DesignColumn::new("x", x)]).unwrap();
        let fit = &out.fit;

        assert!(fit.has_constant);
        assert_eq!(fit.rank, 2);
        assert_eq!(fit.df_model, 1);
        assert_eq!(fit.df_resid, 3);
        assert!((fit.coefficients[0].estimate - 2.2).abs() < 1e-10);
        assert!((fit.coefficients[1].estimate - 0.6).abs() < 1e-10);
        assert!((fit.coefficients[0].std_error - 0.88f64.sqrt()).abs() < 1e-10);
        assert!((fit.coefficients[1].std_error - 0.08f64.sqrt()).abs() < 1e-10);
        assert!((fit.coefficients[1].p_value - 0.1240).abs() < 1e-3);
        assert!((fit.r_squared - 0.6).abs() < 1e-10);
        assert!((fit.adj_r_squared - 0.4666666666).abs() < 1e-8);
        // F = t² for a single regressor.
        assert!((fit.f_value - 4.5).abs() < 1e-9);
        assert!((fit.f_p_value - fit.coefficients[1].p_value).abs() < 1e-9);

        let ssr: f64 = out.residuals.iter().map(|e| e * e).sum();
        assert!((ssr - 2.4).abs() < 1e-10);
    }

    #[test]
    fn exact_fit_has_zero_residuals() {
        // y = 1 + 2a - 3b
        let a = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![1.0, 0.0, 2.0, 1.0, 3.0, 2.0];
        let y: Vec<f64> = a.iter().zip(&b).map(|(a, b)| 1.0 + 2.0 * a - 3.0 * b).collect();
        let out = fit_ols(
            &y,
            &[
                DesignColumn::new("a", a),
                DesignColumn::new("b", b),
                DesignColumn::constant("const", 6),
            ],
        )
        .unwrap();

        assert!((out.fit.coefficients[0].estimate - 2.0).abs() < 1e-10);
        assert!((out.fit.coefficients[1].estimate + 3.0).abs() < 1e-10);
        assert!((out.fit.coefficients[2].estimate - 1.0).abs() < 1e-10);
        assert!(out.residuals.iter().all(|e| e.abs() < 1e-10));
        assert!((out.fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn collinear_columns_reduce_rank_without_failing() {
        let n = 6;
        let y: Vec<f64> = (0..n).map(|i| 0.5 + i as f64).collect();
        let trend: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let out = fit_ols(
            &y,
            &[
                DesignColumn::new("half", vec![0.5; n]),
                DesignColumn::new("trend", trend),
                DesignColumn::constant("const", n),
            ],
        )
        .unwrap();

        assert_eq!(out.fit.rank, 2);
        assert_eq!(out.fit.df_resid, 4);
        assert!(out.residuals.iter().all(|e| e.abs() < 1e-10));
        // Minimum-norm split of the level between the two constant columns.
        let level = 0.5 * out.fit.coefficients[0].estimate + out.fit.coefficients[2].estimate;
        assert!((level - 0.5).abs() < 1e-10);
    }

    #[test]
    fn no_constant_uses_uncentered_r_squared() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 2.0, 3.0, 5.0];
        let out = fit_ols(&y, &[DesignColumn::new("x", x)]).unwrap();
        assert!(!out.fit.has_constant);
        let ssr: f64 = out.residuals.iter().map(|e| e * e).sum();
        let uncentered: f64 = y.iter().map(|v| v * v).sum();
        assert!((out.fit.r_squared - (1.0 - ssr / uncentered)).abs() < 1e-12);
    }

    #[test]
    fn rejects_mismatched_rows() {
        let err = fit_ols(&[1.0, 2.0], &[DesignColumn::new("x", vec![1.0])]).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
