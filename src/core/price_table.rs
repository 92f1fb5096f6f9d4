//! Multi-column daily price table as returned by a series source.

use crate::core::time_series::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// A named numeric column of a [`PriceTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriceColumn {
    name: String,
    values: Vec<f64>,
}

impl PriceColumn {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Daily OHLCV-style table: a `Date` index plus named numeric columns.
///
/// Missing cells are stored as NaN. Dates are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    symbol: String,
    dates: Vec<NaiveDate>,
    columns: Vec<PriceColumn>,
}

impl PriceTable {
    /// Build a table, validating date order and column lengths.
    pub fn new(
        symbol: impl Into<String>,
        dates: Vec<NaiveDate>,
        columns: Vec<PriceColumn>,
    ) -> Result<Self> {
        if let Some(pos) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ForecastError::TimestampError(format!(
                "dates must be strictly increasing (at row {})",
                pos + 1
            )));
        }

        for column in &columns {
            if column.values.len() != dates.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: dates.len(),
                    got: column.values.len(),
                });
            }
        }

        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(ForecastError::InvalidParameter(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            dates,
            columns,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    /// Names of the numeric columns, in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&PriceColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Rows with `start <= date < end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceTable {
        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= start && **d < end)
            .map(|(i, _)| i)
            .collect();

        PriceTable {
            symbol: self.symbol.clone(),
            dates: keep.iter().map(|&i| self.dates[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| PriceColumn::new(c.name.clone(), keep.iter().map(|&i| c.values[i]).collect()))
                .collect(),
        }
    }

    /// Select one column as a labelled time series.
    pub fn select(&self, column: &str) -> Result<TimeSeries> {
        let selected = self.column(column).ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "column '{}' not found (available: {})",
                column,
                self.column_names().join(", ")
            ))
        })?;

        Ok(TimeSeries::from_dates(&self.dates, selected.values.clone())?.with_label(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_table() -> PriceTable {
        let dates = vec![date(2023, 1, 3), date(2023, 1, 4), date(2023, 1, 5)];
        PriceTable::new(
            "AAPL",
            dates,
            vec![
                PriceColumn::new("Open", vec![130.0, 126.9, 127.1]),
                PriceColumn::new("Close", vec![125.1, 126.4, f64::NAN]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn table_exposes_columns_in_order() {
        let table = sample_table();
        assert_eq!(table.symbol(), "AAPL");
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), vec!["Open", "Close"]);
        assert!(table.column("Volume").is_none());
    }

    #[test]
    fn table_select_produces_labelled_series() {
        let table = sample_table();
        let series = table.select("Open").unwrap();
        assert_eq!(series.label(), Some("Open"));
        assert_eq!(series.values(), &[130.0, 126.9, 127.1]);

        let close = table.select("Close").unwrap();
        assert!(close.has_missing_values());
    }

    #[test]
    fn table_select_unknown_column_fails() {
        let table = sample_table();
        let err = table.select("Adj Close").unwrap_err();
        assert!(err.to_string().contains("Adj Close"));
        assert!(err.to_string().contains("Open, Close"));
    }

    #[test]
    fn table_between_is_end_exclusive() {
        let table = sample_table();
        let window = table.between(date(2023, 1, 4), date(2023, 1, 5));
        assert_eq!(window.dates(), &[date(2023, 1, 4)]);
        assert_eq!(window.column("Open").unwrap().values(), &[126.9]);
    }

    #[test]
    fn table_rejects_bad_shapes() {
        let result = PriceTable::new(
            "MSFT",
            vec![date(2023, 1, 3), date(2023, 1, 4)],
            vec![PriceColumn::new("Close", vec![1.0])],
        );
        assert!(matches!(result, Err(ForecastError::DimensionMismatch { .. })));

        let result = PriceTable::new(
            "MSFT",
            vec![date(2023, 1, 4), date(2023, 1, 3)],
            vec![PriceColumn::new("Close", vec![1.0, 2.0])],
        );
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));

        let result = PriceTable::new(
            "MSFT",
            vec![date(2023, 1, 3)],
            vec![
                PriceColumn::new("Close", vec![1.0]),
                PriceColumn::new("Close", vec![2.0]),
            ],
        );
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }
}
