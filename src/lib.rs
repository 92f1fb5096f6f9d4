//! # stock-forecast
//!
//! Stationarity testing, classical seasonal decomposition and SARIMA
//! forecasting for daily stock prices.
//!
//! A run fetches a price table for one ticker, selects a column, runs an
//! augmented Dickey-Fuller test, decomposes the series, fits a seasonal
//! ARIMA model by conditional sum of squares and forecasts a number of days
//! past the end of the data window. See [`pipeline::run_pipeline`].
//!
//! ```no_run
//! use stock_forecast::prelude::*;
//! use stock_forecast::source::CsvSource;
//!
//! let config = DashboardConfig::default();
//! let request = config.to_request().unwrap();
//! let report = run_pipeline(&CsvSource::new(&config.data_dir), &request).unwrap();
//! println!("{}", report.summary);
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod presentation;
pub mod seasonality;
pub mod source;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::DashboardConfig;
    pub use crate::core::{Forecast, ForecastResult, PriceTable, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{forecast, Forecaster, ModelParameters, SARIMASpec, SARIMA};
    pub use crate::pipeline::{run_pipeline, PipelineReport, PipelineRequest, Session};
    pub use crate::seasonality::seasonal_decompose;
    pub use crate::source::SeriesSource;
    pub use crate::validation::adf_test;
}
