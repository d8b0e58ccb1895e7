//! Workbook loading.
//!
//! A workbook is three named sheets:
//!
//! - `rates`: year column, then one rate column per rating (in percent)
//! - `wealth`: year column, then one total-return index column per rating
//! - `common`: year, VIX, reference rate
//!
//! The default backend reads a directory holding `rates.csv`, `wealth.csv`
//! and `common.csv`. Sheet access goes through [`SheetSource`], so the
//! validation below does not care where the tables come from.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use crate::domain::{Dataset, Rating, RatingSeries};
use crate::error::AppError;

pub const DEFAULT_DATASET: &str = "annualBofA";

pub const SHEET_RATES: &str = "rates";
pub const SHEET_WEALTH: &str = "wealth";
pub const SHEET_COMMON: &str = "common";

/// Smallest usable history: three residuals after differencing.
pub const MIN_YEARS: usize = 4;

/// A numeric sheet: a year index plus named value columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    /// Value column headers (the index column header is dropped).
    pub headers: Vec<String>,
    pub years: Vec<i32>,
    /// Column-major values, `columns[j][t]`.
    pub columns: Vec<Vec<f64>>,
}

impl Table {
    pub fn n_rows(&self) -> usize {
        self.years.len()
    }
}

/// Anything that can hand out named sheets.
pub trait SheetSource {
    fn sheet(&self, name: &str) -> Result<Table, AppError>;
}

/// Sheets stored as `<dir>/<name>.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

impl SheetSource for CsvDirectory {
    fn sheet(&self, name: &str) -> Result<Table, AppError> {
        let path = self.sheet_path(name);
        let file = File::open(&path)
            .map_err(|e| AppError::input(format!("Failed to open sheet '{name}' at '{}': {e}", path.display())))?;
        read_table(name, file)
    }
}

/// Parse one CSV sheet.
pub fn read_table(name: &str, reader: impl std::io::Read) -> Result<Table, AppError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::input(format!("Sheet '{name}': failed to read headers: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect();
    if headers.len() < 2 {
        return Err(AppError::input(format!(
            "Sheet '{name}': expected a year column and at least one value column."
        )));
    }

    let width = headers.len() - 1;
    let mut years = Vec::new();
    let mut columns = vec![Vec::new(); width];

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::input(format!("Sheet '{name}', line {line}: {e}")))?;

        let first = record.get(0).unwrap_or_default();
        if record.iter().all(str::is_empty) {
            continue;
        }
        let year = parse_year(first)
            .ok_or_else(|| AppError::input(format!("Sheet '{name}', line {line}: invalid year '{first}'.")))?;
        years.push(year);

        for (j, column) in columns.iter_mut().enumerate() {
            let cell = record.get(j + 1).unwrap_or_default();
            let value = parse_f64(cell).ok_or_else(|| {
                AppError::input(format!(
                    "Sheet '{name}', line {line}, column '{}': invalid number '{cell}'.",
                    headers[j + 1]
                ))
            })?;
            column.push(value);
        }
    }

    debug!(sheet = name, rows = years.len(), columns = width, "sheet read");

    Ok(Table {
        name: name.to_string(),
        headers: headers[1..].to_vec(),
        years,
        columns,
    })
}

/// Load the default CSV workbook from a directory.
pub fn load_workbook(dir: &Path) -> Result<Dataset, AppError> {
    if !dir.is_dir() {
        return Err(AppError::input(format!(
            "Dataset directory '{}' does not exist (expected {SHEET_RATES}.csv, {SHEET_WEALTH}.csv, {SHEET_COMMON}.csv).",
            dir.display()
        )));
    }
    info!(path = %dir.display(), "loading workbook");
    load_dataset(&CsvDirectory::new(dir))
}

/// Read the three sheets and validate them into a [`Dataset`].
pub fn load_dataset(source: &dyn SheetSource) -> Result<Dataset, AppError> {
    let rates = source.sheet(SHEET_RATES)?;
    let wealth = source.sheet(SHEET_WEALTH)?;
    let common = source.sheet(SHEET_COMMON)?;

    let rate_ratings = rating_columns(&rates)?;
    let wealth_ratings = rating_columns(&wealth)?;
    if rate_ratings != wealth_ratings {
        return Err(AppError::data(format!(
            "Sheets '{SHEET_RATES}' and '{SHEET_WEALTH}' must carry the same rating columns in the same order (got [{}] vs [{}]).",
            join_ratings(&rate_ratings),
            join_ratings(&wealth_ratings)
        )));
    }

    if common.columns.len() < 2 {
        return Err(AppError::input(format!(
            "Sheet '{SHEET_COMMON}': expected VIX and reference rate columns after the year column."
        )));
    }

    for other in [&wealth, &common] {
        if other.years != rates.years {
            return Err(AppError::data(format!(
                "Sheet '{}' is not aligned with '{SHEET_RATES}': year columns differ.",
                other.name
            )));
        }
    }

    let n = rates.n_rows();
    if n < MIN_YEARS {
        return Err(AppError::data(format!("Need at least {MIN_YEARS} years of data, got {n}.")));
    }

    let vix = common.columns[0].clone();
    let trate = common.columns[1].clone();
    if let Some(pos) = vix.iter().position(|&v| v <= 0.0) {
        return Err(AppError::data(format!(
            "VIX must be strictly positive (year {}: {}).",
            rates.years[pos], vix[pos]
        )));
    }

    let mut series = Vec::with_capacity(rate_ratings.len());
    for (j, &rating) in rate_ratings.iter().enumerate() {
        let w = &wealth.columns[j];
        if let Some(pos) = w.iter().position(|&v| v <= 0.0) {
            return Err(AppError::data(format!(
                "Wealth for {rating} must be strictly positive (year {}: {}).",
                rates.years[pos], w[pos]
            )));
        }
        series.push(RatingSeries {
            rating,
            rates: rates.columns[j].iter().map(|r| r / 100.0).collect(),
            wealth: w.clone(),
        });
    }

    info!(years = n, ratings = series.len(), "workbook loaded");

    Ok(Dataset {
        years: rates.years,
        vix,
        trate,
        series,
    })
}

/// Write a dataset back out as a CSV workbook (rates in percent).
pub fn write_workbook(dir: &Path, dataset: &Dataset) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", dir.display())))?;
    let source = CsvDirectory::new(dir);

    let names: Vec<&str> = dataset.series.iter().map(|s| s.rating.display_name()).collect();

    let rate_cols: Vec<Vec<f64>> = dataset
        .series
        .iter()
        .map(|s| s.rates.iter().map(|r| r * 100.0).collect())
        .collect();
    write_sheet(&source.sheet_path(SHEET_RATES), &names, &dataset.years, &rate_cols)?;

    let wealth_cols: Vec<Vec<f64>> = dataset.series.iter().map(|s| s.wealth.clone()).collect();
    write_sheet(&source.sheet_path(SHEET_WEALTH), &names, &dataset.years, &wealth_cols)?;

    write_sheet(
        &source.sheet_path(SHEET_COMMON),
        &["vix", "trate"],
        &dataset.years,
        &[dataset.vix.clone(), dataset.trate.clone()],
    )?;

    info!(path = %dir.display(), "workbook written");
    Ok(())
}

fn write_sheet(path: &Path, headers: &[&str], years: &[i32], columns: &[Vec<f64>]) -> Result<(), AppError> {
    let err = |e: csv::Error| AppError::input(format!("Failed to write '{}': {e}", path.display()));
    let mut writer = csv::Writer::from_path(path).map_err(err)?;

    let mut header = vec!["year"];
    header.extend_from_slice(headers);
    writer.write_record(&header).map_err(err)?;

    for (t, year) in years.iter().enumerate() {
        let mut row = vec![year.to_string()];
        row.extend(columns.iter().map(|c| c[t].to_string()));
        writer.write_record(&row).map_err(err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))
}

/// Rating for each value column, by header name.
///
/// When no header names a rating (descriptive index names), columns are taken
/// positionally in the canonical order `Corporate, AAA, ..., CCC`.
fn rating_columns(table: &Table) -> Result<Vec<Rating>, AppError> {
    if !table.headers.is_empty() && table.headers.iter().all(|h| Rating::from_header(h).is_none()) {
        if table.headers.len() > Rating::ALL.len() {
            return Err(AppError::input(format!(
                "Sheet '{}': {} unrecognised rating columns, at most {} can be assigned by position.",
                table.name,
                table.headers.len(),
                Rating::ALL.len()
            )));
        }
        let ratings = Rating::ALL[..table.headers.len()].to_vec();
        warn!(
            sheet = %table.name,
            ratings = %join_ratings(&ratings),
            "no rating headers recognised; assigning ratings by column position"
        );
        return Ok(ratings);
    }

    let mut out = Vec::with_capacity(table.headers.len());
    for header in &table.headers {
        let rating = Rating::from_header(header).ok_or_else(|| {
            AppError::input(format!(
                "Sheet '{}': unrecognised rating column '{header}'.",
                table.name
            ))
        })?;
        if out.contains(&rating) {
            return Err(AppError::input(format!(
                "Sheet '{}': duplicate rating column '{header}'.",
                table.name
            )));
        }
        out.push(rating);
    }
    Ok(out)
}

fn join_ratings(ratings: &[Rating]) -> String {
    ratings.iter().map(|r| r.display_name()).collect::<Vec<_>>().join(", ")
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_year(s: &str) -> Option<i32> {
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    if let Ok(v) = s.parse::<f64>() {
        if v.is_finite() && v.fract() == 0.0 {
            return Some(v as i32);
        }
    }
    // Spreadsheet date cells exported as ISO dates.
    NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct InMemory(HashMap<&'static str, &'static str>);

    impl SheetSource for InMemory {
        fn sheet(&self, name: &str) -> Result<Table, AppError> {
            let text = self
                .0
                .get(name)
                .ok_or_else(|| AppError::input(format!("missing sheet {name}")))?;
            read_table(name, text.as_bytes())
        }
    }

    fn source(rates: &'static str, wealth: &'static str, common: &'static str) -> InMemory {
        InMemory(HashMap::from([("rates", rates), ("wealth", wealth), ("common", common)]))
    }

    const RATES: &str = "\u{feff}Year,AAA,BB\n2000,5.0,8.0\n2001,5.5,8.5\n2002,5.2,9.1\n2003,4.9,8.7\n";
    const WEALTH: &str = "Year,AAA,BB\n2000,100,100\n2001,104,106\n2002,109,113\n2003,114,118\n";
    const COMMON: &str = "Year,VIX,TRate\n2000,20,1.5\n2001,25,1.7\n2002,18,1.2\n2003,22,1.1\n";

    #[test]
    fn loads_and_scales_rates() {
        let ds = load_dataset(&source(RATES, WEALTH, COMMON)).unwrap();
        assert_eq!(ds.years, vec![2000, 2001, 2002, 2003]);
        assert_eq!(ds.ratings(), vec![Rating::Aaa, Rating::Bb]);
        assert!((ds.series[0].rates[1] - 0.055).abs() < 1e-15);
        assert_eq!(ds.vix, vec![20.0, 25.0, 18.0, 22.0]);
        assert_eq!(ds.trate[0], 1.5);
    }

    #[test]
    fn misaligned_years_are_rejected() {
        let common = "Year,VIX,TRate\n2000,20,1.5\n2001,25,1.7\n2002,18,1.2\n2004,22,1.1\n";
        let err = load_dataset(&source(RATES, WEALTH, common)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("common"));
    }

    #[test]
    fn mismatched_rating_headers_are_rejected() {
        let wealth = "Year,BB,AAA\n2000,100,100\n2001,104,106\n2002,109,113\n2003,114,118\n";
        let err = load_dataset(&source(RATES, wealth, COMMON)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("[AAA, BB] vs [BB, AAA]"));
    }

    #[test]
    fn unknown_rating_header_is_an_input_error() {
        let rates = "Year,AAA,XYZ\n2000,5.0,8.0\n2001,5.5,8.5\n2002,5.2,9.1\n2003,4.9,8.7\n";
        let err = load_dataset(&source(rates, WEALTH, COMMON)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn descriptive_headers_are_assigned_by_position() {
        let rates = "Year,US Corp Master,US Corp AAA,US Corp AA\n2000,6.1,5.0,5.4\n2001,6.4,5.5,5.8\n2002,6.0,5.2,5.5\n2003,5.7,4.9,5.1\n";
        let wealth = "Year,C0A0 TR,C0A1 TR,C0A2 TR\n2000,100,100,100\n2001,104,106,105\n2002,109,113,110\n2003,114,118,116\n";
        let ds = load_dataset(&source(rates, wealth, COMMON)).unwrap();
        assert_eq!(ds.ratings(), vec![Rating::Corporate, Rating::Aaa, Rating::Aa]);
        assert!((ds.series_for(Rating::Aa).unwrap().rates[1] - 0.058).abs() < 1e-15);
    }

    #[test]
    fn too_many_positional_columns_is_an_input_error() {
        let rates = "Year,c1,c2,c3,c4,c5,c6,c7,c8,c9\n2000,1,1,1,1,1,1,1,1,1\n2001,1,1,1,1,1,1,1,1,1\n2002,1,1,1,1,1,1,1,1,1\n2003,1,1,1,1,1,1,1,1,1\n";
        let err = load_dataset(&source(rates, WEALTH, COMMON)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bad_cell_reports_line_and_column() {
        let rates = "Year,AAA,BB\n2000,5.0,8.0\n2001,n/a,8.5\n2002,5.2,9.1\n2003,4.9,8.7\n";
        let err = load_dataset(&source(rates, WEALTH, COMMON)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("line 3"));
        assert!(err.to_string().contains("AAA"));
    }

    #[test]
    fn non_positive_vix_is_rejected() {
        let common = "Year,VIX,TRate\n2000,20,1.5\n2001,0,1.7\n2002,18,1.2\n2003,22,1.1\n";
        let err = load_dataset(&source(RATES, WEALTH, common)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn too_few_years_is_rejected() {
        let rates = "Year,AAA\n2000,5.0\n2001,5.5\n2002,5.2\n";
        let wealth = "Year,AAA\n2000,100\n2001,104\n2002,109\n";
        let common = "Year,VIX,TRate\n2000,20,1.5\n2001,25,1.7\n2002,18,1.2\n";
        let err = load_dataset(&source(rates, wealth, common)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn year_cells_accept_common_spreadsheet_forms() {
        assert_eq!(parse_year("1996"), Some(1996));
        assert_eq!(parse_year("1996.0"), Some(1996));
        assert_eq!(parse_year("1996-12-31"), Some(1996));
        assert_eq!(parse_year("1996-12-31 00:00:00"), Some(1996));
        assert_eq!(parse_year("FY96"), None);
    }
}
