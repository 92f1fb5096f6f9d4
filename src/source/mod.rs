//! Price data acquisition.
//!
//! A [`SeriesSource`] supplies a daily [`PriceTable`] for a symbol and a
//! half-open date window `[start, end)`. Two implementations ship with the
//! crate: [`CsvSource`] reads exported CSV files and [`MemorySource`] serves
//! tables held in memory.

mod csv_file;
mod memory;

pub use csv_file::CsvSource;
pub use memory::MemorySource;

use crate::core::PriceTable;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Symbols offered by the dashboard.
pub const TICKERS: [&str; 13] = [
    "AAPL", "MSFT", "GOOG", "GOOGL", "META", "TSLA", "NVDA", "ADBE", "PYPL", "INTC", "CMCSA",
    "NFLX", "PEP",
];

/// Supplier of daily price tables.
pub trait SeriesSource {
    /// Fetch rows with `start <= date < end`.
    ///
    /// # Errors
    /// [`ForecastError::DataFetch`] when the symbol is unknown or the window
    /// holds no rows.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable>;
}

impl<S: SeriesSource + ?Sized> SeriesSource for &S {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        (**self).fetch(symbol, start, end)
    }
}

impl<S: SeriesSource + ?Sized> SeriesSource for Box<S> {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        (**self).fetch(symbol, start, end)
    }
}

/// A symbol from the [`TICKERS`] allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker(String);

impl Ticker {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Ticker(TICKERS[0].to_string())
    }
}

impl FromStr for Ticker {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        if TICKERS.contains(&upper.as_str()) {
            Ok(Ticker(upper))
        } else {
            Err(ForecastError::InvalidParameter(format!(
                "unsupported ticker '{}' (choose one of {})",
                s,
                TICKERS.join(", ")
            )))
        }
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reject windows that cannot contain a row.
pub(crate) fn check_window(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start >= end {
        return Err(ForecastError::InvalidParameter(format!(
            "start date {} must be before end date {}",
            start, end
        )));
    }
    Ok(())
}

/// Restrict a table to the window, failing when nothing remains.
pub(crate) fn window(table: &PriceTable, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
    let selected = table.between(start, end);
    if selected.is_empty() {
        return Err(ForecastError::DataFetch(format!(
            "no data for {} between {} and {}",
            table.symbol(),
            start,
            end
        )));
    }
    Ok(selected)
}
