use crate::core::PriceTable;
use crate::error::{ForecastError, Result};
use crate::source::{check_window, window, SeriesSource};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Price tables held in memory, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, PriceTable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the table for its symbol.
    pub fn insert(&mut self, table: PriceTable) {
        self.tables.insert(table.symbol().to_string(), table);
    }

    pub fn with_table(mut self, table: PriceTable) -> Self {
        self.insert(table);
        self
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

impl SeriesSource for MemorySource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        check_window(start, end)?;
        let table = self
            .tables
            .get(symbol)
            .ok_or_else(|| ForecastError::DataFetch(format!("unknown symbol {}", symbol)))?;
        window(table, start, end)
    }
}
