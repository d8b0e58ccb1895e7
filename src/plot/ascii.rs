//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - ACF: zero line `-`, stems `|` with `o` tips, confidence band `.`
//! - QQ: reference line `-`, sample quantiles `o`
//! - line charts: one marker per series, legend below the grid

use std::io::Write;

use crate::error::AppError;
use crate::plot::{Figure, FigureKind, FigureSink, Series};

const SERIES_MARKERS: [char; 8] = ['*', '+', 'x', 'o', '#', '@', '%', '&'];

/// Prints figures as text to a writer (stdout by default).
pub struct AsciiSink<W: Write> {
    out: W,
    width: usize,
    height: usize,
}

impl AsciiSink<std::io::Stdout> {
    pub fn stdout(width: usize, height: usize) -> Self {
        Self::new(std::io::stdout(), width, height)
    }
}

impl<W: Write> AsciiSink<W> {
    pub fn new(out: W, width: usize, height: usize) -> Self {
        Self { out, width, height }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FigureSink for AsciiSink<W> {
    fn render(&mut self, figure: &Figure) -> Result<(), AppError> {
        let text = render_figure(figure, self.width, self.height);
        writeln!(self.out, "{text}").map_err(|e| AppError::input(format!("Failed to write plot: {e}")))
    }
}

/// Render one figure to a string.
pub fn render_figure(figure: &Figure, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let body = match &figure.kind {
        FigureKind::Acf { values, band } => render_acf(values, band, width, height),
        FigureKind::Qq {
            points,
            slope,
            intercept,
        } => render_qq(points, *slope, *intercept, width, height),
        FigureKind::Lines { series } => render_lines(series, width, height),
    };

    format!("{}\n{body}", figure.title)
}

fn render_acf(values: &[f64], band: &[f64], width: usize, height: usize) -> String {
    let lags = values.len();
    let x_min = 0.0;
    let x_max = lags as f64 + 1.0;

    let ys = values
        .iter()
        .chain(band.iter())
        .copied()
        .chain(band.iter().map(|b| -b))
        .chain(std::iter::once(0.0));
    let (y_min, y_max) = finite_range(ys).unwrap_or((-1.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let zero = map_y(0.0, y_min, y_max, height);
    draw_line(&mut grid, 0, zero, width - 1, zero, '-');

    for (i, &v) in values.iter().enumerate() {
        let lag = (i + 1) as f64;
        let x = map_x(lag, x_min, x_max, width);
        if let Some(&b) = band.get(i) {
            for yb in [b, -b] {
                if yb.is_finite() {
                    let row = map_y(yb, y_min, y_max, height);
                    if grid[row][x] == ' ' || grid[row][x] == '-' {
                        grid[row][x] = '.';
                    }
                }
            }
        }
        if !v.is_finite() {
            continue;
        }
        let tip = map_y(v, y_min, y_max, height);
        let (lo, hi) = if tip < zero { (tip, zero) } else { (zero, tip) };
        for row in grid.iter_mut().take(hi + 1).skip(lo) {
            row[x] = '|';
        }
        grid[tip][x] = 'o';
    }

    let mut out = format!("Plot: lags=1..{lags} | acf=[{y_min:.3}, {y_max:.3}]\n");
    push_grid(&mut out, grid);
    out
}

fn render_qq(points: &[(f64, f64)], slope: f64, intercept: f64, width: usize, height: usize) -> String {
    let (x_min, x_max) = finite_range(points.iter().map(|p| p.0)).unwrap_or((-1.0, 1.0));
    let line = [(x_min, intercept + slope * x_min), (x_max, intercept + slope * x_max)];

    let ys = points.iter().map(|p| p.1).chain(line.iter().map(|p| p.1));
    let (y_min, y_max) = finite_range(ys).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    draw_curve(&mut grid, &line, x_min, x_max, y_min, y_max, '-');

    for &(x, y) in points {
        if x.is_finite() && y.is_finite() {
            let col = map_x(x, x_min, x_max, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][col] = 'o';
        }
    }

    let mut out = format!("Plot: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.3}, {y_max:.3}]\n");
    push_grid(&mut out, grid);
    out
}

fn render_lines(series: &[Series], width: usize, height: usize) -> String {
    let all = || series.iter().flat_map(|s| s.points.iter());
    let (x_min, x_max) = finite_range(all().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = finite_range(all().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for (i, s) in series.iter().enumerate() {
        let marker = SERIES_MARKERS[i % SERIES_MARKERS.len()];
        for &(x, y) in &s.points {
            if x.is_finite() && y.is_finite() {
                let col = map_x(x, x_min, x_max, width);
                let row = map_y(y, y_min, y_max, height);
                grid[row][col] = marker;
            }
        }
    }

    let mut out = format!("Plot: x=[{x_min:.0}, {x_max:.0}] | y=[{y_min:.4}, {y_max:.4}]\n");
    push_grid(&mut out, grid);

    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", SERIES_MARKERS[i % SERIES_MARKERS.len()], s.name))
        .collect();
    out.push_str(&legend.join("  "));
    out.push('\n');
    out
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64, ch: char) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qq_golden_snapshot_small() {
        let figure = Figure {
            title: "QQ".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            kind: FigureKind::Qq {
                points: vec![(0.0, 0.0), (1.0, 1.0)],
                slope: 0.0,
                intercept: 0.5,
            },
        };

        let txt = render_figure(&figure, 10, 5);
        let expected = concat!(
            "QQ\n",
            "Plot: x=[0.000, 1.000] | y=[-0.050, 1.050]\n",
            "         o\n",
            "          \n",
            "----------\n",
            "          \n",
            "o         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn acf_stems_reach_from_zero_line() {
        let figure = Figure {
            title: "ACF".to_string(),
            x_label: "Lags".to_string(),
            y_label: "ACF".to_string(),
            kind: FigureKind::Acf {
                values: vec![0.8, -0.4, 0.1],
                band: vec![0.3, 0.35, 0.4],
            },
        };
        let txt = render_figure(&figure, 40, 12);
        let rows: Vec<&str> = txt.lines().skip(2).collect();
        assert_eq!(rows.len(), 12);
        assert_eq!(txt.matches('o').count(), 3);
        assert!(rows.iter().any(|r| r.contains('.')));
        assert!(rows.iter().any(|r| r.trim_start_matches(['-', '|', 'o', '.']).is_empty()));
    }

    #[test]
    fn line_chart_has_legend() {
        let figure = Figure {
            title: "Rates".to_string(),
            x_label: "Year".to_string(),
            y_label: "Rate".to_string(),
            kind: FigureKind::Lines {
                series: vec![
                    Series { name: "AAA".into(), points: vec![(2000.0, 0.05), (2001.0, 0.06)] },
                    Series { name: "BB".into(), points: vec![(2000.0, 0.08), (2001.0, 0.07)] },
                ],
            },
        };
        let txt = render_figure(&figure, 20, 6);
        assert!(txt.ends_with("* AAA  + BB\n"));
        assert_eq!(txt.matches('*').count(), 3);
    }

    #[test]
    fn sink_writes_to_buffer() {
        let mut sink = AsciiSink::new(Vec::new(), 12, 5);
        let figure = Figure {
            title: "T".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            kind: FigureKind::Acf { values: vec![0.2], band: vec![0.5] },
        };
        sink.render(&figure).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.starts_with("T\nPlot: lags=1..1"));
    }
}
