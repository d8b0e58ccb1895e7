//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the pure analysis code
//! - printed by the report formatter
//! - exported to JSON/CSV or handed to a plotting sink

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// ICE BofA rating bucket (plus the all-ratings `Corporate` composite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum Rating {
    #[value(name = "corporate")]
    #[serde(rename = "Corporate")]
    Corporate,
    #[value(name = "aaa")]
    #[serde(rename = "AAA")]
    Aaa,
    #[value(name = "aa")]
    #[serde(rename = "AA")]
    Aa,
    #[value(name = "a")]
    #[serde(rename = "A")]
    A,
    #[value(name = "bbb")]
    #[serde(rename = "BBB")]
    Bbb,
    #[value(name = "bb")]
    #[serde(rename = "BB")]
    Bb,
    #[value(name = "b")]
    #[serde(rename = "B")]
    B,
    #[value(name = "ccc")]
    #[serde(rename = "CCC")]
    Ccc,
}

impl Rating {
    pub const ALL: [Rating; 8] = [
        Rating::Corporate,
        Rating::Aaa,
        Rating::Aa,
        Rating::A,
        Rating::Bbb,
        Rating::Bb,
        Rating::B,
        Rating::Ccc,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Rating::Corporate => "Corporate",
            Rating::Aaa => "AAA",
            Rating::Aa => "AA",
            Rating::A => "A",
            Rating::Bbb => "BBB",
            Rating::Bb => "BB",
            Rating::B => "B",
            Rating::Ccc => "CCC",
        }
    }

    /// The all-ratings index rather than a single rating bucket.
    pub fn is_composite(self) -> bool {
        self == Rating::Corporate
    }

    /// Match a sheet header to a rating (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn from_header(header: &str) -> Option<Rating> {
        let h = header.trim();
        Rating::ALL
            .into_iter()
            .find(|r| r.display_name().eq_ignore_ascii_case(h))
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Which rating columns of the workbook to analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RatingSet {
    /// Every rating column present in the workbook, in header order.
    All,
    /// Every rating column except the `Corporate` composite.
    ExComposite,
}

/// Where diagnostic figures go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlotMode {
    None,
    Ascii,
    Svg,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub rating_set: RatingSet,
    /// Explicit rating list; overrides `rating_set` when present.
    pub ratings: Option<Vec<Rating>>,

    pub plot: PlotMode,
    pub plot_dir: Option<PathBuf>,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_json: Option<PathBuf>,
    pub export_residuals: Option<PathBuf>,

    /// Skip the text report on stdout.
    pub quiet: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(crate::io::workbook::DEFAULT_DATASET),
            rating_set: RatingSet::All,
            ratings: None,
            plot: PlotMode::None,
            plot_dir: None,
            plot_width: 80,
            plot_height: 20,
            export_json: None,
            export_residuals: None,
            quiet: false,
        }
    }
}

/// Rate and wealth history of one rating bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSeries {
    pub rating: Rating,
    /// Annual rate as a fraction (sheet value / 100).
    pub rates: Vec<f64>,
    /// Total-return index level.
    pub wealth: Vec<f64>,
}

impl RatingSeries {
    /// `ln(W(t+1)) - ln(W(t))`, length `N - 1`.
    pub fn log_returns(&self) -> Vec<f64> {
        self.wealth.windows(2).map(|w| w[1].ln() - w[0].ln()).collect()
    }

    /// `R(t+1) - R(t)`, length `N - 1`.
    pub fn rate_changes(&self) -> Vec<f64> {
        self.rates.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

/// The loaded, validated dataset. Immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub years: Vec<i32>,
    pub vix: Vec<f64>,
    /// Reference rate from the `common` sheet (loaded and summarised, not regressed).
    pub trate: Vec<f64>,
    pub series: Vec<RatingSeries>,
}

impl Dataset {
    pub fn n_years(&self) -> usize {
        self.years.len()
    }

    pub fn ratings(&self) -> Vec<Rating> {
        self.series.iter().map(|s| s.rating).collect()
    }

    pub fn series_for(&self, rating: Rating) -> Option<&RatingSeries> {
        self.series.iter().find(|s| s.rating == rating)
    }

    pub fn log_vix(&self) -> Vec<f64> {
        self.vix.iter().map(|v| v.ln()).collect()
    }
}

/// Pearson correlation and its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Simple regression output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    pub r_squared: f64,
    /// Two-sided p-value for `slope = 0`.
    pub p_value: f64,
    pub slope_stderr: f64,
    pub intercept_stderr: f64,
    pub n: usize,
    /// The regressor had zero variance; the slope is not identified.
    pub degenerate: bool,
}

/// One row of a regression summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
    /// 95% confidence interval.
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Multivariate OLS summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    pub coefficients: Vec<Coefficient>,
    pub n: usize,
    pub rank: usize,
    pub df_model: usize,
    pub df_resid: usize,
    pub has_constant: bool,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_value: f64,
    pub f_p_value: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub durbin_watson: f64,
    pub condition_number: f64,
}

impl OlsFit {
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < self.coefficients.len()
    }

    pub fn params(&self) -> Vec<f64> {
        self.coefficients.iter().map(|c| c.estimate).collect()
    }
}

/// Either kind of fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FitSummary {
    Simple(SimpleFit),
    Ols(OlsFit),
}

/// Residual diagnostics (normality and serial dependence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub n: usize,
    pub stdev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    /// `Σ_{k=1..5} |acf_k|` of the residuals.
    pub acf_sum_raw: f64,
    /// `Σ_{k=1..5} |acf_k|` of the absolute residuals.
    pub acf_sum_abs: f64,
    pub shapiro_w: f64,
    pub shapiro_p: f64,
    pub jarque_bera: f64,
    pub jarque_bera_p: f64,
}

/// The regression specifications of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// AR(1) of log VIX.
    VolatilityAr,
    /// Simple AR(1) of rates.
    RateAr,
    /// AR(1) of rates normalised by VIX.
    RateArVix,
    /// Excess return on rate change.
    ReturnSimple,
    /// Excess return on rate change normalised by VIX.
    ReturnVix,
}

impl ModelKind {
    pub fn equation(self) -> &'static str {
        match self {
            ModelKind::VolatilityAr => "log(V(t)) = a + b * log(V(t-1)) + Z(t)",
            ModelKind::RateAr => "R(t) - R(t-1) = a + b * R(t-1) + Z(t)",
            ModelKind::RateArVix => "R(t) - R(t-1) = a + b * R(t-1) + c * V(t) + V(t) * Z(t)",
            ModelKind::ReturnSimple => "Q(t) - R(t-1) = a + b * (R(t) - R(t-1)) + Z(t)",
            ModelKind::ReturnVix => "Q(t) - R(t-1) = a + b * (R(t) - R(t-1)) + c * V(t) + Z(t) * V(t)",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ModelKind::VolatilityAr => "Autoregression Log Heston",
            ModelKind::RateAr => "AR for rates",
            ModelKind::RateArVix => "AR of rates with VIX",
            ModelKind::ReturnSimple => "Returns minus rate, simple regression vs rate change",
            ModelKind::ReturnVix => "Returns minus rate vs rate change, with VIX",
        }
    }

    /// Short identifier for file names and CSV exports.
    pub fn slug(self) -> &'static str {
        match self {
            ModelKind::VolatilityAr => "vol-ar",
            ModelKind::RateAr => "rate-ar",
            ModelKind::RateArVix => "rate-ar-vix",
            ModelKind::ReturnSimple => "return-simple",
            ModelKind::ReturnVix => "return-vix",
        }
    }
}

/// One fitted model with its residual series and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub kind: ModelKind,
    /// Label used for figure titles, e.g. "Bond Rates, Simple Regression for Rating AAA".
    pub label: String,
    pub fit: FitSummary,
    pub residuals: Vec<f64>,
    pub diagnostics: Diagnostics,
    /// Correlation of the residuals with the volatility residuals `Z`.
    pub correlation_with_vol: Option<Correlation>,
}

/// All four specifications for one rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingReport {
    pub rating: Rating,
    pub rate_ar: ModelReport,
    pub rate_ar_vix: ModelReport,
    /// R² of the rate/VIX autoregression without the `c · V(t)` term.
    pub rate_ar_vix_cut_r_squared: f64,
    pub return_simple: ModelReport,
    pub return_vix: ModelReport,
    /// Sample covariance of {Z, rate/VIX residuals, return/VIX residuals}.
    pub residual_covariance: Vec<Vec<f64>>,
}

impl RatingReport {
    pub fn models(&self) -> [&ModelReport; 4] {
        [&self.rate_ar, &self.rate_ar_vix, &self.return_simple, &self.return_vix]
    }
}

/// Summary of the input data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub first_year: i32,
    pub last_year: i32,
    pub n_years: usize,
    pub ratings: Vec<Rating>,
    pub vix_mean: f64,
    pub trate_mean: f64,
}

/// The complete, structured result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub dataset: DatasetSummary,
    pub volatility: ModelReport,
    pub ratings: Vec<RatingReport>,
}
