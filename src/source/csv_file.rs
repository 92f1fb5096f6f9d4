use crate::core::{PriceColumn, PriceTable};
use crate::error::{ForecastError, Result};
use crate::source::{check_window, window, SeriesSource};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reads `<dir>/<SYMBOL>.csv` exports.
///
/// The first column must be `Date` (`YYYY-MM-DD`, an optional time suffix
/// is ignored); every other column is numeric. Empty cells, `null` and
/// `NaN` become missing values.
///
/// ```text
/// Date,Open,High,Low,Close,Adj Close,Volume
/// 2023-01-03,130.28,130.90,124.17,125.07,124.22,112117500
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the export for `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Parse a whole export into a table.
    pub fn read_table(&self, symbol: &str) -> Result<PriceTable> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(ForecastError::DataFetch(format!(
                "no price file for {} at {}",
                symbol,
                path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| fetch_error(&path, e))?;
        let headers = reader.headers().map_err(|e| fetch_error(&path, e))?.clone();

        match headers.get(0) {
            Some(first) if first.trim().eq_ignore_ascii_case("date") => {}
            _ => {
                return Err(ForecastError::DataFetch(format!(
                    "{}: first column must be Date",
                    path.display()
                )))
            }
        }
        let names: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

        let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| fetch_error(&path, e))?;
            let row = line + 2;

            let raw_date = record.get(0).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(raw_date.get(..10).unwrap_or(raw_date), DATE_FORMAT)
                .map_err(|e| {
                    ForecastError::DataFetch(format!(
                        "{} row {}: invalid date '{}': {}",
                        path.display(),
                        row,
                        raw_date,
                        e
                    ))
                })?;

            let values = (1..=names.len())
                .map(|i| parse_cell(record.get(i).unwrap_or_default()))
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|cell| {
                    ForecastError::DataFetch(format!(
                        "{} row {}: '{}' is not a number",
                        path.display(),
                        row,
                        cell
                    ))
                })?;

            rows.push((date, values));
        }

        rows.sort_by_key(|(date, _)| *date);
        let dates: Vec<NaiveDate> = rows.iter().map(|(d, _)| *d).collect();
        let columns = names
            .iter()
            .enumerate()
            .map(|(i, name)| PriceColumn::new(name.clone(), rows.iter().map(|(_, v)| v[i]).collect()))
            .collect();

        debug!(symbol, rows = dates.len(), path = %path.display(), "read price file");
        PriceTable::new(symbol, dates, columns)
    }
}

fn parse_cell(cell: &str) -> std::result::Result<f64, String> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("null") || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>().map_err(|_| cell.to_string())
}

fn fetch_error(path: &Path, err: csv::Error) -> ForecastError {
    ForecastError::DataFetch(format!("{}: {}", path.display(), err))
}

impl SeriesSource for CsvSource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        check_window(start, end)?;
        let table = window(&self.read_table(symbol)?, start, end)?;
        info!(
            symbol,
            %start,
            %end,
            rows = table.len(),
            "fetched price table"
        );
        Ok(table)
    }
}
