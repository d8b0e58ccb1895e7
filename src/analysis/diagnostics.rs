//! Residual diagnostics: spread, shape, serial dependence, and normality.

use crate::domain::Diagnostics;
use crate::error::AppError;
use crate::math::{
    DIAGNOSTIC_LAGS, acf_abs_sum, excess_kurtosis, jarque_bera, shapiro_wilk, skewness, std_dev,
};

/// Compute the diagnostics for one residual series.
///
/// Errors only when the sample is too short for Shapiro–Wilk (`n < 3`) or
/// contains non-finite values. Zero-variance samples produce NaN shape and
/// test statistics.
pub fn diagnose(sample: &[f64]) -> Result<Diagnostics, AppError> {
    let abs: Vec<f64> = sample.iter().map(|v| v.abs()).collect();
    let sw = shapiro_wilk(sample)?;
    let jb = jarque_bera(sample)?;

    Ok(Diagnostics {
        n: sample.len(),
        stdev: std_dev(sample),
        skewness: skewness(sample),
        kurtosis: excess_kurtosis(sample),
        acf_sum_raw: acf_abs_sum(sample, DIAGNOSTIC_LAGS),
        acf_sum_abs: acf_abs_sum(&abs, DIAGNOSTIC_LAGS),
        shapiro_w: sw.statistic,
        shapiro_p: sw.p_value,
        jarque_bera: jb.statistic,
        jarque_bera_p: jb.p_value,
    })
}
