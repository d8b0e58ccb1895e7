//! Log-Heston volatility autoregression.
//!
//! `log V(t) = a + (1 + b) · log V(t-1) + Z(t)`, fitted as the simple
//! regression of `Δ log V` on lagged `log V`. The residual series `Z` is the
//! shared volatility shock that every rating's residuals are compared with.

use tracing::{debug, warn};

use crate::analysis::diagnostics::diagnose;
use crate::domain::{Dataset, FitSummary, ModelKind, ModelReport};
use crate::error::AppError;
use crate::math::linregress;

pub const VOL_LABEL: &str = " AR log VIX";

/// Fit the volatility autoregression and diagnose its residuals.
pub fn analyze_volatility(dataset: &Dataset) -> Result<ModelReport, AppError> {
    let lvix = dataset.log_vix();
    let n = lvix.len();
    if n < 4 {
        return Err(AppError::data(format!("Volatility autoregression needs at least 4 years, got {n}.")));
    }

    let lagged = &lvix[..n - 1];
    let dlvix: Vec<f64> = lvix.windows(2).map(|w| w[1] - w[0]).collect();
    let fit = linregress(lagged, &dlvix)?;
    if fit.degenerate {
        warn!("log VIX has zero variance; volatility autoregression slope is not identified");
    }

    let residuals: Vec<f64> = (0..n - 1)
        .map(|k| lvix[k + 1] - lvix[k] * (fit.slope + 1.0) - fit.intercept)
        .collect();
    let diagnostics = diagnose(&residuals)?;
    debug!(slope = fit.slope, intercept = fit.intercept, r2 = fit.r_squared, "volatility AR fitted");

    Ok(ModelReport {
        kind: ModelKind::VolatilityAr,
        label: VOL_LABEL.to_string(),
        fit: FitSummary::Simple(fit),
        residuals,
        diagnostics,
        correlation_with_vol: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Rating, RatingSeries};

    fn dataset_with_vix(vix: Vec<f64>) -> Dataset {
        let n = vix.len();
        Dataset {
            years: (0..n as i32).map(|i| 2000 + i).collect(),
            trate: vec![0.02; n],
            series: vec![RatingSeries {
                rating: Rating::Aaa,
                rates: vec![0.03; n],
                wealth: vec![1.0; n],
            }],
            vix,
        }
    }

    #[test]
    fn residuals_match_the_levels_form() {
        let vix = vec![20.0, 25.0, 18.0, 30.0, 22.0, 16.0, 19.0, 27.0, 21.0, 24.0];
        let report = analyze_volatility(&dataset_with_vix(vix.clone())).unwrap();
        let FitSummary::Simple(fit) = &report.fit else {
            panic!("expected a simple fit");
        };

        assert_eq!(report.residuals.len(), vix.len() - 1);
        // Same residuals as the difference form of the regression.
        for k in 0..vix.len() - 1 {
            let x = vix[k].ln();
            let dy = vix[k + 1].ln() - x;
            let expected = dy - fit.slope * x - fit.intercept;
            assert!((report.residuals[k] - expected).abs() < 1e-12);
        }
        // OLS residuals with an intercept sum to zero.
        assert!(report.residuals.iter().sum::<f64>().abs() < 1e-10);
    }

    #[test]
    fn constant_vix_is_flagged_degenerate() {
        let report = analyze_volatility(&dataset_with_vix(vec![20.0; 10])).unwrap();
        let FitSummary::Simple(fit) = &report.fit else {
            panic!("expected a simple fit");
        };
        assert!(fit.degenerate);
        assert_eq!(fit.slope, 0.0);
        assert!(report.residuals.iter().all(|&z| z == 0.0));
    }

    #[test]
    fn constant_vix_over_a_full_history_is_degenerate() {
        let report = analyze_volatility(&dataset_with_vix(vec![20.0; 27])).unwrap();
        let FitSummary::Simple(fit) = &report.fit else {
            panic!("expected a simple fit");
        };
        assert!(fit.degenerate);
        assert_eq!(report.residuals.len(), 26);
        assert!(report.residuals.iter().all(|&z| z == 0.0));
    }
}
