//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/analysis code stays clean and testable
//! - output changes are localized (important for snapshot tests)
//!
//! Rounding follows the usual reporting convention for these diagnostics:
//! standard deviation and test p-values to 5 decimals, shape statistics and
//! ACF sums to 3.

use crate::domain::{
    Correlation, DatasetSummary, Diagnostics, FitSummary, ModelKind, ModelReport, OlsFit, RatingReport, Report,
    SimpleFit,
};

const RULE_WIDTH: usize = 78;

/// Format the whole report.
pub fn format_report(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format_dataset_summary(&report.dataset));
    out.push('\n');
    out.push_str(&format_volatility(&report.volatility));
    for rating in &report.ratings {
        out.push('\n');
        out.push_str(&format_rating(rating));
    }
    out
}

pub fn format_dataset_summary(summary: &DatasetSummary) -> String {
    let ratings: Vec<&str> = summary.ratings.iter().map(|r| r.display_name()).collect();
    let mut out = String::new();
    out.push_str("=== bvx - Bond Rates, Returns and VIX ===\n");
    out.push_str(&format!(
        "Years: {}-{} (n={})\n",
        summary.first_year, summary.last_year, summary.n_years
    ));
    out.push_str(&format!("Ratings: {}\n", ratings.join(", ")));
    out.push_str(&format!(
        "Mean VIX: {:.3} | Mean reference rate: {:.3}\n",
        summary.vix_mean, summary.trate_mean
    ));
    out
}

/// The log-VIX autoregression block.
pub fn format_volatility(model: &ModelReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", ModelKind::VolatilityAr.title()));
    out.push_str(&format!("{}\n", ModelKind::VolatilityAr.equation()));
    if let FitSummary::Simple(fit) = &model.fit {
        out.push_str(&format!("Slope = {:.3} Intercept = {:.3}\n", fit.slope, fit.intercept));
        out.push_str(&format!("R^2 = {:.3} p-value = {:.3}\n", fit.r_squared, fit.p_value));
        if fit.degenerate {
            out.push_str("(degenerate: log VIX has zero variance)\n");
        }
    }
    out.push_str(&format_diagnostics(&model.diagnostics));
    out
}

/// All four specifications for one rating, plus the cut R² and the residual
/// covariance matrix.
pub fn format_rating(report: &RatingReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Ratings {}\n", report.rating));

    out.push_str(&format_model(&report.rate_ar));

    out.push_str(&format_model(&report.rate_ar_vix));
    out.push_str("Cut AR of rates with VIX\n");
    out.push_str("R(t) - R(t-1) = a + b * R(t-1) + V(t) * Z(t)\n");
    out.push_str(&format!(
        "R^2 of cut autoregression with VIX = {:.6}\n",
        report.rate_ar_vix_cut_r_squared
    ));

    out.push_str(&format_model(&report.return_simple));
    out.push_str(&format_model(&report.return_vix));

    out.push_str("Covariance Matrix for Residuals =\n");
    out.push_str(&format_matrix(&report.residual_covariance));
    out
}

/// One model: title, equation, fit, diagnostics, and correlation with `Z`.
pub fn format_model(model: &ModelReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", model.kind.title()));
    out.push_str(&format!("{}\n", model.kind.equation()));
    match &model.fit {
        FitSummary::Simple(fit) => out.push_str(&format_simple_fit(fit)),
        FitSummary::Ols(fit) => out.push_str(&format_ols_summary(fit, &model.label)),
    }
    out.push_str(&format_diagnostics(&model.diagnostics));
    if let Some(corr) = &model.correlation_with_vol {
        out.push_str(&format_correlation(corr));
    }
    out
}

pub fn format_simple_fit(fit: &SimpleFit) -> String {
    let mut out = format!(
        "slope = {:.6} intercept = {:.6} p = {:.5}\n",
        fit.slope, fit.intercept, fit.p_value
    );
    out.push_str(&format!(
        "rvalue = {:.5} stderr = {:.6} intercept_stderr = {:.6}\n",
        fit.r_value, fit.slope_stderr, fit.intercept_stderr
    ));
    if fit.degenerate {
        out.push_str("(degenerate: regressor has zero variance)\n");
    }
    out
}

/// A regression summary table in the familiar two-panel layout.
pub fn format_ols_summary(fit: &OlsFit, title: &str) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("{:^width$}\n", "OLS Regression Results", width = RULE_WIDTH));
    out.push_str(&heavy);
    out.push('\n');

    let left = [
        ("Model:", title.trim().to_string()),
        ("Method:", "Least Squares".to_string()),
        ("No. Observations:", fit.n.to_string()),
        ("Df Residuals:", fit.df_resid.to_string()),
        ("Df Model:", fit.df_model.to_string()),
        ("Covariance Type:", "nonrobust".to_string()),
    ];
    let right = [
        ("R-squared:", fmt_num(fit.r_squared, 3)),
        ("Adj. R-squared:", fmt_num(fit.adj_r_squared, 3)),
        ("F-statistic:", fmt_num(fit.f_value, 3)),
        ("Prob (F-statistic):", fmt_num(fit.f_p_value, 3)),
        ("Log-Likelihood:", fmt_num(fit.log_likelihood, 3)),
        ("AIC:", fmt_num(fit.aic, 3)),
    ];
    for ((lk, lv), (rk, rv)) in left.iter().zip(right.iter()) {
        out.push_str(&format!("{lk:<20}{:>18}   {rk:<22}{rv:>15}\n", truncate(lv, 18)));
    }
    out.push_str(&format!("{:<20}{:>18}   {:<22}{:>15}\n", "", "", "BIC:", fmt_num(fit.bic, 3)));

    out.push_str(&heavy);
    out.push('\n');
    out.push_str(&format!(
        "{:<10}{:>12}{:>12}{:>10}{:>10}{:>12}{:>12}\n",
        "", "coef", "std err", "t", "P>|t|", "[0.025", "0.975]"
    ));
    out.push_str(&light);
    out.push('\n');
    for c in &fit.coefficients {
        out.push_str(&format!(
            "{:<10}{:>12}{:>12}{:>10}{:>10}{:>12}{:>12}\n",
            truncate(&c.name, 10),
            fmt_num(c.estimate, 4),
            fmt_num(c.std_error, 4),
            fmt_num(c.t_value, 3),
            fmt_num(c.p_value, 3),
            fmt_num(c.ci_lower, 4),
            fmt_num(c.ci_upper, 4),
        ));
    }
    out.push_str(&heavy);
    out.push('\n');
    out.push_str(&format!(
        "{:<20}{:>18}   {:<22}{:>15}\n",
        "Durbin-Watson:",
        fmt_num(fit.durbin_watson, 3),
        "Cond. No.",
        fmt_num(fit.condition_number, 3)
    ));
    out.push_str(&heavy);
    out.push('\n');

    if !fit.has_constant {
        out.push_str("Note: R² is computed without centering (uncentered) since the model does not contain a constant.\n");
    }
    if fit.is_rank_deficient() {
        out.push_str(&format!(
            "Note: the design matrix has rank {} < {} columns; minimum-norm estimates shown.\n",
            fit.rank,
            fit.coefficients.len()
        ));
    }

    let params: Vec<String> = fit
        .coefficients
        .iter()
        .map(|c| format!("{} = {:.6}", c.name, c.estimate))
        .collect();
    out.push_str(&format!("Params: {}\n", params.join(", ")));
    out
}

pub fn format_diagnostics(d: &Diagnostics) -> String {
    let mut out = String::new();
    out.push_str(&format!("Stdev = {:.5}\n", d.stdev));
    out.push_str(&format!("Skewness = {:.3}\n", d.skewness));
    out.push_str(&format!("Kurtosis = {:.3}\n", d.kurtosis));
    out.push_str(&format!("ACF L1 original values = {:.3}\n", d.acf_sum_raw));
    out.push_str(&format!("ACF L1 absolute values = {:.3}\n", d.acf_sum_abs));
    out.push_str(&format!("Shapiro-Wilk p = {:.5}\n", d.shapiro_p));
    out.push_str(&format!("Jarque-Bera p = {:.5}\n", d.jarque_bera_p));
    out
}

pub fn format_correlation(c: &Correlation) -> String {
    format!("Correlation = {:.5} (p = {:.5}, n = {})\n", c.r, c.p_value, c.n)
}

pub fn format_matrix(m: &[Vec<f64>]) -> String {
    let mut out = String::new();
    for row in m {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:>14.6e}")).collect();
        out.push_str(&format!("[{}]\n", cells.join(" ")));
    }
    out
}

fn fmt_num(v: f64, decimals: usize) -> String {
    if v.is_finite() {
        format!("{v:.decimals$}")
    } else if v.is_nan() {
        "nan".to_string()
    } else if v > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coefficient;

    fn diagnostics() -> Diagnostics {
        Diagnostics {
            n: 26,
            stdev: 0.123456789,
            skewness: -0.98765,
            kurtosis: f64::NAN,
            acf_sum_raw: 1.23456,
            acf_sum_abs: 0.5,
            shapiro_w: 0.95,
            shapiro_p: 0.0123456,
            jarque_bera: 1.2,
            jarque_bera_p: 0.5,
        }
    }

    #[test]
    fn diagnostics_are_rounded() {
        let txt = format_diagnostics(&diagnostics());
        let expected = concat!(
            "Stdev = 0.12346\n",
            "Skewness = -0.988\n",
            "Kurtosis = NaN\n",
            "ACF L1 original values = 1.235\n",
            "ACF L1 absolute values = 0.500\n",
            "Shapiro-Wilk p = 0.01235\n",
            "Jarque-Bera p = 0.50000\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn ols_summary_lists_coefficients_and_notes() {
        let coef = |name: &str, estimate: f64| Coefficient {
            name: name.to_string(),
            estimate,
            std_error: 0.1,
            t_value: estimate / 0.1,
            p_value: 0.04,
            ci_lower: estimate - 0.2,
            ci_upper: estimate + 0.2,
        };
        let fit = OlsFit {
            coefficients: vec![coef("const", 0.5), coef("lag", -0.25), coef("vix", 0.0)],
            n: 26,
            rank: 2,
            df_model: 1,
            df_resid: 24,
            has_constant: true,
            r_squared: 0.4,
            adj_r_squared: 0.375,
            f_value: 16.0,
            f_p_value: 0.0005,
            log_likelihood: 12.0,
            aic: -20.0,
            bic: -17.5,
            durbin_watson: 2.1,
            condition_number: f64::INFINITY,
        };
        let txt = format_ols_summary(&fit, "Bond Rates, Full Regression for Rating AAA");
        assert!(txt.contains("OLS Regression Results"));
        assert!(txt.contains("lag"));
        assert!(txt.contains("-0.2500"));
        assert!(txt.contains("inf"));
        assert!(txt.contains("rank 2 < 3"));
        assert!(txt.ends_with("Params: const = 0.500000, lag = -0.250000, vix = 0.000000\n"));
    }

    #[test]
    fn matrix_rows_are_bracketed() {
        let txt = format_matrix(&[vec![1.0, 0.5], vec![0.5, 2.0]]);
        assert_eq!(txt.lines().count(), 2);
        assert!(txt.starts_with('['));
        assert!(txt.contains("5.000000e-1"));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("duration", 10), "duration");
        assert_eq!(truncate("abcdefghijkl", 5), "abcd.");
    }
}
