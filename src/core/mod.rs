//! Core data structures: price tables, series and forecasts.

mod forecast;
mod price_table;
mod time_series;

pub use forecast::{ActualVsPredicted, ComparisonRow, Forecast, ForecastResult, ForecastRow};
pub use price_table::{PriceColumn, PriceTable};
pub use time_series::{midnight_utc, MissingValuePolicy, TimeSeries};
