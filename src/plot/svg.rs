//! SVG output via Plotters.
//!
//! One file per figure, numbered in render order so a directory listing
//! follows the report: `001_corporate_bond_rates.svg`, ...

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::debug;

use crate::error::AppError;
use crate::plot::{Figure, FigureKind, FigureSink};

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

type DrawResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Writes each figure as an SVG file under `dir`.
pub struct SvgSink {
    dir: PathBuf,
    size: (u32, u32),
    counter: usize,
    written: Vec<PathBuf>,
}

impl SvgSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| AppError::input(format!("Failed to create plot directory {}: {e}", dir.display())))?;
        Ok(Self {
            dir,
            size: (800, 600),
            counter: 0,
            written: Vec::new(),
        })
    }

    /// Files written so far, in render order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FigureSink for SvgSink {
    fn render(&mut self, figure: &Figure) -> Result<(), AppError> {
        self.counter += 1;
        let path = self.dir.join(format!("{:03}_{}.svg", self.counter, file_stem(&figure.title)));
        draw_figure(&path, self.size, figure)
            .map_err(|e| AppError::input(format!("Failed to write {}: {e}", path.display())))?;
        debug!(path = %path.display(), "figure written");
        self.written.push(path);
        Ok(())
    }
}

/// Lowercase alphanumeric stem derived from a title.
pub fn file_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_end_matches('_');
    if stem.is_empty() { "figure".to_string() } else { stem.to_string() }
}

fn draw_figure(path: &Path, size: (u32, u32), figure: &Figure) -> DrawResult<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    // Plotters captions are single-line.
    let caption = figure.title.split('\n').map(str::trim).collect::<Vec<_>>().join(" | ");

    match &figure.kind {
        FigureKind::Acf { values, band } => {
            let lags = values.len() as f64;
            let (y0, y1) = bounds(values.iter().chain(band.iter()).copied().chain(band.iter().map(|b| -b)), (-1.0, 1.0));
            let mut chart = ChartBuilder::on(&root)
                .caption(caption, ("sans-serif", 18))
                .margin(10)
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .build_cartesian_2d(0.0..lags + 1.0, y0.min(0.0)..y1.max(0.0))?;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc(figure.x_label.as_str())
                .y_desc(figure.y_label.as_str())
                .draw()?;

            // Bartlett band.
            let upper: Vec<(f64, f64)> = band
                .iter()
                .enumerate()
                .filter(|(_, b)| b.is_finite())
                .map(|(i, &b)| ((i + 1) as f64, b))
                .collect();
            let lower: Vec<(f64, f64)> = upper.iter().map(|&(x, b)| (x, -b)).collect();
            let band_style = PALETTE[0].mix(0.35);
            chart.draw_series(LineSeries::new(upper, band_style))?;
            chart.draw_series(LineSeries::new(lower, band_style))?;

            chart.draw_series(std::iter::once(PathElement::new(vec![(0.0, 0.0), (lags + 1.0, 0.0)], BLACK)))?;
            chart.draw_series(
                values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(i, &v)| PathElement::new(vec![((i + 1) as f64, 0.0), ((i + 1) as f64, v)], PALETTE[0])),
            )?;
            chart.draw_series(
                values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(i, &v)| Circle::new(((i + 1) as f64, v), 3, PALETTE[0].filled())),
            )?;
        }
        FigureKind::Qq {
            points,
            slope,
            intercept,
        } => {
            let (x0, x1) = bounds(points.iter().map(|p| p.0), (-1.0, 1.0));
            let line = [(x0, intercept + slope * x0), (x1, intercept + slope * x1)];
            let (y0, y1) = bounds(points.iter().map(|p| p.1).chain(line.iter().map(|p| p.1)), (-1.0, 1.0));
            let mut chart = ChartBuilder::on(&root)
                .caption(caption, ("sans-serif", 18))
                .margin(10)
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .build_cartesian_2d(x0..x1, y0..y1)?;
            chart
                .configure_mesh()
                .x_desc(figure.x_label.as_str())
                .y_desc(figure.y_label.as_str())
                .draw()?;
            chart.draw_series(LineSeries::new(line, PALETTE[3]))?;
            chart.draw_series(
                points
                    .iter()
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .map(|&p| Circle::new(p, 3, PALETTE[0].filled())),
            )?;
        }
        FigureKind::Lines { series } => {
            let all = || series.iter().flat_map(|s| s.points.iter());
            let (x0, x1) = bounds(all().map(|p| p.0), (0.0, 1.0));
            let (y0, y1) = bounds(all().map(|p| p.1), (0.0, 1.0));
            let mut chart = ChartBuilder::on(&root)
                .caption(caption, ("sans-serif", 18))
                .margin(10)
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .build_cartesian_2d(x0..x1, y0..y1)?;
            chart
                .configure_mesh()
                .x_desc(figure.x_label.as_str())
                .y_desc(figure.y_label.as_str())
                .x_label_formatter(&|v| format!("{v:.0}"))
                .draw()?;
            for (i, s) in series.iter().enumerate() {
                let color = PALETTE[i % PALETTE.len()];
                chart
                    .draw_series(LineSeries::new(
                        s.points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()),
                        color,
                    ))?
                    .label(s.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
    }

    root.present()?;
    Ok(())
}

/// Finite min/max with a small pad; `fallback` when nothing is finite.
fn bounds(values: impl Iterator<Item = f64>, fallback: (f64, f64)) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return fallback;
    }
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.05 } else { lo.abs().max(1.0) * 0.05 };
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::diagnostic_figures;

    #[test]
    fn file_stem_is_filesystem_safe() {
        assert_eq!(file_stem(" AR log VIX\n ACF for Original Values"), "ar_log_vix_acf_for_original_values");
        assert_eq!(file_stem("Wealth ..., 1990 = 1$"), "wealth_1990_1");
        assert_eq!(file_stem("\n\n"), "figure");
    }

    #[test]
    fn writes_numbered_svg_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SvgSink::new(dir.path().join("plots")).unwrap();
        let x = [0.3, -0.1, 0.4, -0.2, 0.05, 0.12, -0.33, 0.2, -0.07, 0.01];
        for figure in diagnostic_figures(&x, "Test").unwrap() {
            sink.render(&figure).unwrap();
        }

        let written = sink.written();
        assert_eq!(written.len(), 3);
        assert!(written[0].file_name().unwrap().to_string_lossy().starts_with("001_test_acf"));
        let svg = std::fs::read_to_string(&written[2]).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn bounds_handle_flat_and_empty_input() {
        assert_eq!(bounds(std::iter::empty(), (0.0, 1.0)), (0.0, 1.0));
        let (lo, hi) = bounds([2.0, 2.0].into_iter(), (0.0, 1.0));
        assert!(lo < 2.0 && hi > 2.0);
    }
}
