//! Per-rating regressions of rates and returns.
//!
//! For one rating with rate `R`, one-period log return `Q`, and VIX `V`
//! (`V(t)` aligned with the change from `t-1` to `t`):
//!
//! 1. rate AR: `ΔR(t) ~ R(t-1)` (simple regression)
//! 2. rate AR with VIX: `ΔR/V ~ [1/V, R(t-1)/V, 1]` (OLS), plus the cut
//!    model without the constant column for an R² comparison
//! 3. returns: `Q(t) - R(t-1) ~ ΔR(t)` (simple regression)
//! 4. returns with VIX: `(Q - R(t-1))/V ~ [1/V, ΔR/V, 1]` (OLS)
//!
//! The only state shared across ratings is the volatility residual series
//! `Z`, which is passed in explicitly. Ratings are therefore independent and
//! are evaluated in parallel.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analysis::diagnostics::diagnose;
use crate::domain::{Correlation, Dataset, FitSummary, ModelKind, ModelReport, Rating, RatingReport};
use crate::error::AppError;
use crate::math::{DesignColumn, covariance_matrix, fit_ols, linregress, pearson};

/// Analyse each rating (in parallel) and return the reports in input order.
pub fn analyze_ratings(
    dataset: &Dataset,
    ratings: &[Rating],
    vol_residuals: &[f64],
) -> Result<Vec<RatingReport>, AppError> {
    ratings
        .par_iter()
        .map(|&rating| analyze_rating(dataset, rating, vol_residuals))
        .collect()
}

/// Run the four specifications for one rating.
pub fn analyze_rating(dataset: &Dataset, rating: Rating, vol_residuals: &[f64]) -> Result<RatingReport, AppError> {
    let series = dataset
        .series_for(rating)
        .ok_or_else(|| AppError::data(format!("Rating {rating} is not present in the dataset.")))?;

    let n = dataset.n_years();
    if n < 4 || series.rates.len() != n || series.wealth.len() != n || dataset.vix.len() != n {
        return Err(AppError::data(format!(
            "Rating {rating}: series must share a time index of at least 4 years."
        )));
    }
    if vol_residuals.len() != n - 1 {
        return Err(AppError::data(format!(
            "Volatility residuals have {} points, expected {}.",
            vol_residuals.len(),
            n - 1
        )));
    }

    let rate = &series.rates;
    let lagged_rate = &rate[..n - 1];
    let drate = series.rate_changes();
    let returns = series.log_returns();
    let v = &dataset.vix[1..];

    info!(%rating, "analysing rating");

    // 1) Simple autoregression for rates.
    let rate_fit = linregress(lagged_rate, &drate)?;
    warn_if_degenerate(rating, ModelKind::RateAr, rate_fit.degenerate);
    let rate_ar = model_report(
        ModelKind::RateAr,
        format!("Bond Rates, Simple Regression for Rating {rating}"),
        FitSummary::Simple(rate_fit.clone()),
        rate_fit.residuals(lagged_rate, &drate),
        None,
    )?;

    // 2) Rate autoregression normalised by VIX.
    let y_rate: Vec<f64> = drate.iter().zip(v).map(|(d, v)| d / v).collect();
    let inv_v: Vec<f64> = v.iter().map(|v| 1.0 / v).collect();
    let lag_over_v: Vec<f64> = lagged_rate.iter().zip(v).map(|(r, v)| r / v).collect();
    let rate_vix = fit_ols(
        &y_rate,
        &[
            DesignColumn::new("const", inv_v.clone()),
            DesignColumn::new("lag", lag_over_v.clone()),
            DesignColumn::constant("vix", n - 1),
        ],
    )?;
    warn_if_rank_deficient(rating, ModelKind::RateArVix, rate_vix.fit.is_rank_deficient());
    let rate_corr = pearson(&rate_vix.residuals, vol_residuals);
    let rate_ar_vix = model_report(
        ModelKind::RateArVix,
        format!("Bond Rates, Full Regression for Rating {rating}"),
        FitSummary::Ols(rate_vix.fit),
        rate_vix.residuals,
        Some(rate_corr),
    )?;

    // The same model without the `c · V(t)` term.
    let cut = fit_ols(
        &y_rate,
        &[DesignColumn::new("const", inv_v.clone()), DesignColumn::new("lag", lag_over_v)],
    )?;
    let rate_ar_vix_cut_r_squared = cut.fit.r_squared;

    // 3) Excess return vs rate change.
    let excess: Vec<f64> = returns.iter().zip(lagged_rate).map(|(q, r)| q - r).collect();
    let ret_fit = linregress(&drate, &excess)?;
    warn_if_degenerate(rating, ModelKind::ReturnSimple, ret_fit.degenerate);
    let return_simple = model_report(
        ModelKind::ReturnSimple,
        format!("Bond Returns, Simple Regression for Rating {rating}"),
        FitSummary::Simple(ret_fit.clone()),
        ret_fit.residuals(&drate, &excess),
        None,
    )?;

    // 4) Excess return vs rate change, normalised by VIX.
    let y_ret: Vec<f64> = excess.iter().zip(v).map(|(e, v)| e / v).collect();
    let drate_over_v: Vec<f64> = drate.iter().zip(v).map(|(d, v)| d / v).collect();
    let ret_vix = fit_ols(
        &y_ret,
        &[
            DesignColumn::new("const", inv_v),
            DesignColumn::new("duration", drate_over_v),
            DesignColumn::constant("vix", n - 1),
        ],
    )?;
    warn_if_rank_deficient(rating, ModelKind::ReturnVix, ret_vix.fit.is_rank_deficient());
    let ret_corr = pearson(&ret_vix.residuals, vol_residuals);
    let return_vix = model_report(
        ModelKind::ReturnVix,
        format!("Bond Returns, Full Regression for Rating {rating}"),
        FitSummary::Ols(ret_vix.fit),
        ret_vix.residuals,
        Some(ret_corr),
    )?;

    let residual_covariance = covariance_matrix(&[
        vol_residuals,
        &rate_ar_vix.residuals,
        &return_vix.residuals,
    ]);

    Ok(RatingReport {
        rating,
        rate_ar,
        rate_ar_vix,
        rate_ar_vix_cut_r_squared,
        return_simple,
        return_vix,
        residual_covariance,
    })
}

fn model_report(
    kind: ModelKind,
    label: String,
    fit: FitSummary,
    residuals: Vec<f64>,
    correlation_with_vol: Option<Correlation>,
) -> Result<ModelReport, AppError> {
    if residuals.iter().any(|e| !e.is_finite()) {
        return Err(AppError::numeric(format!("{label}: non-finite residuals.")));
    }
    let diagnostics = diagnose(&residuals)?;
    debug!(model = kind.slug(), stdev = diagnostics.stdev, "residuals diagnosed");
    Ok(ModelReport {
        kind,
        label,
        fit,
        residuals,
        diagnostics,
        correlation_with_vol,
    })
}

fn warn_if_degenerate(rating: Rating, kind: ModelKind, degenerate: bool) {
    if degenerate {
        warn!(%rating, model = kind.slug(), "regressor has zero variance; slope not identified");
    }
}

fn warn_if_rank_deficient(rating: Rating, kind: ModelKind, deficient: bool) {
    if deficient {
        warn!(%rating, model = kind.slug(), "design matrix is rank deficient; using minimum-norm solution");
    }
}
