//! Diagnostic figures.
//!
//! Figures are plain data computed from a residual series (or the dataset).
//! A `FigureSink` decides what to do with them: print them as ASCII, write
//! SVG files, or drop them. Nothing in the analysis depends on rendering.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::domain::{Dataset, Report};
use crate::error::AppError;
use crate::math::{acf, bartlett_band, default_plot_lags, mean, std_dev};

pub mod ascii;
pub mod svg;

pub use ascii::AsciiSink;
pub use svg::SvgSink;

/// A named `(x, y)` series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FigureKind {
    /// Autocorrelations for lags `1..=values.len()` with a symmetric band.
    Acf { values: Vec<f64>, band: Vec<f64> },
    /// Ordered sample against normal quantiles, with the reference line
    /// `y = intercept + slope · q`.
    Qq {
        points: Vec<(f64, f64)>,
        slope: f64,
        intercept: f64,
    },
    /// One or more line series sharing the x axis.
    Lines { series: Vec<Series> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: FigureKind,
}

/// Receives figures for rendering.
pub trait FigureSink {
    fn render(&mut self, figure: &Figure) -> Result<(), AppError>;
}

/// Discards every figure.
#[derive(Debug, Default)]
pub struct NullSink;

impl FigureSink for NullSink {
    fn render(&mut self, _figure: &Figure) -> Result<(), AppError> {
        Ok(())
    }
}

/// The three residual figures: ACF of the values, ACF of the absolute values,
/// and a normal QQ plot.
pub fn diagnostic_figures(sample: &[f64], label: &str) -> Result<[Figure; 3], AppError> {
    let abs: Vec<f64> = sample.iter().map(|v| v.abs()).collect();
    Ok([
        acf_figure(sample, format!("{label}\n ACF for Original Values")),
        acf_figure(&abs, format!("{label}\n ACF for Absolute Values")),
        qq_figure(sample, format!("{label}\n Quantile-Quantile Plot vs Normal"))?,
    ])
}

fn acf_figure(sample: &[f64], title: String) -> Figure {
    let n = sample.len();
    let r = acf(sample, default_plot_lags(n));
    let band = bartlett_band(&r, n);
    Figure {
        title,
        x_label: "Lags".to_string(),
        y_label: "ACF".to_string(),
        kind: FigureKind::Acf {
            values: r.into_iter().skip(1).collect(),
            band,
        },
    }
}

fn qq_figure(sample: &[f64], title: String) -> Result<Figure, AppError> {
    let norm = Normal::new(0.0, 1.0).map_err(|e| AppError::numeric(format!("Normal distribution error: {e}")))?;
    let n = sample.len();
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    // Plotting positions i / (n + 1).
    let points = sorted
        .iter()
        .enumerate()
        .map(|(i, &y)| (norm.inverse_cdf((i + 1) as f64 / (n + 1) as f64), y))
        .collect();

    Ok(Figure {
        title,
        x_label: "Theoretical Quantiles".to_string(),
        y_label: "Sample Quantiles".to_string(),
        kind: FigureKind::Qq {
            points,
            slope: std_dev(sample),
            intercept: mean(sample),
        },
    })
}

/// Rates by rating over the years.
pub fn rates_overview(dataset: &Dataset) -> Figure {
    let series = dataset
        .series
        .iter()
        .map(|s| Series {
            name: s.rating.display_name().to_string(),
            points: dataset.years.iter().zip(&s.rates).map(|(&y, &r)| (f64::from(y), r)).collect(),
        })
        .collect();
    Figure {
        title: "Corporate bond rates".to_string(),
        x_label: "Year".to_string(),
        y_label: "Rate".to_string(),
        kind: FigureKind::Lines { series },
    }
}

/// Wealth by rating, normalised to 1 at the first year.
pub fn wealth_overview(dataset: &Dataset) -> Figure {
    let first_year = dataset.years.first().copied().unwrap_or_default();
    let series = dataset
        .series
        .iter()
        .map(|s| {
            let base = s.wealth.first().copied().unwrap_or(1.0);
            Series {
                name: s.rating.display_name().to_string(),
                points: dataset
                    .years
                    .iter()
                    .zip(&s.wealth)
                    .map(|(&y, &w)| (f64::from(y), w / base))
                    .collect(),
            }
        })
        .collect();
    Figure {
        title: format!("Wealth process for corporate rated bonds, {first_year} = 1$"),
        x_label: "Year".to_string(),
        y_label: "Wealth".to_string(),
        kind: FigureKind::Lines { series },
    }
}

/// Render the overview figures and every residual series of a report, in
/// report order.
pub fn render_report(sink: &mut dyn FigureSink, dataset: &Dataset, report: &Report) -> Result<(), AppError> {
    sink.render(&rates_overview(dataset))?;
    sink.render(&wealth_overview(dataset))?;

    for figure in diagnostic_figures(&report.volatility.residuals, &report.volatility.label)? {
        sink.render(&figure)?;
    }
    for rating in &report.ratings {
        for model in rating.models() {
            for figure in diagnostic_figures(&model.residuals, &model.label)? {
                sink.render(&figure)?;
            }
        }
    }
    Ok(())
}
