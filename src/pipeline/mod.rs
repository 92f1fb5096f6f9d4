//! The forecasting pipeline.
//!
//! ```text
//! fetch → column selection → stationarity → decomposition → model fit → forecast
//! ```
//!
//! Every stage is a function of the previous stage's output plus the user's
//! parameters. The first failure aborts the run and is reported together
//! with the [`Stage`] that produced it.

mod session;

pub use session::{PlotVisibility, RunTicket, Session};

use crate::core::{ActualVsPredicted, ForecastResult, MissingValuePolicy, PriceTable, TimeSeries};
use crate::error::ForecastError;
use crate::models::sarima::{forecast, ModelParameters, ModelSummary, SARIMA};
use crate::models::Forecaster;
use crate::seasonality::{ClassicalDecomposition, DecompositionResult, DEFAULT_PERIOD};
use crate::source::{SeriesSource, Ticker};
use crate::validation::{adf_test, AdfResult};
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    ColumnSelection,
    Stationarity,
    Decomposition,
    ModelFit,
    Forecast,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Fetch,
        Stage::ColumnSelection,
        Stage::Stationarity,
        Stage::Decomposition,
        Stage::ModelFit,
        Stage::Forecast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::ColumnSelection => "column selection",
            Stage::Stationarity => "stationarity",
            Stage::Decomposition => "decomposition",
            Stage::ModelFit => "model fit",
            Stage::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure tagged with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} stage failed: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub error: ForecastError,
}

impl PipelineError {
    pub fn new(stage: Stage, error: ForecastError) -> Self {
        Self { stage, error }
    }
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> AtStage<T> for crate::error::Result<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|error| PipelineError::new(stage, error))
    }
}

/// Everything the user chooses for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub ticker: Ticker,
    pub start: NaiveDate,
    /// Exclusive end of the data window; also the first forecast date.
    pub end: NaiveDate,
    pub column: String,
    pub parameters: ModelParameters,
    pub horizon_days: usize,
    pub decomposition_period: usize,
    pub missing_values: MissingValuePolicy,
}

impl PipelineRequest {
    pub fn new(ticker: Ticker, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker,
            start,
            end,
            column: "Close".to_string(),
            parameters: ModelParameters::default(),
            horizon_days: 10,
            decomposition_period: DEFAULT_PERIOD,
            missing_values: MissingValuePolicy::Error,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn with_parameters(mut self, parameters: ModelParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_horizon(mut self, horizon_days: usize) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_missing_values(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_values = policy;
        self
    }
}

/// Output of a complete run, in page order.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub request: PipelineRequest,
    /// Full fetched table.
    pub table: PriceTable,
    /// The selected column after missing-value handling.
    pub series: TimeSeries,
    pub adf: AdfResult,
    /// `adf.p_value < 0.05`
    pub stationary: bool,
    pub decomposition: DecompositionResult,
    pub summary: ModelSummary,
    pub forecast: ForecastResult,
    pub comparison: ActualVsPredicted,
}

/// Run every stage for one request.
pub fn run_pipeline<S>(source: &S, request: &PipelineRequest) -> Result<PipelineReport, PipelineError>
where
    S: SeriesSource + ?Sized,
{
    info!(
        ticker = %request.ticker,
        start = %request.start,
        end = %request.end,
        column = %request.column,
        "pipeline started"
    );

    let table = source
        .fetch(request.ticker.as_str(), request.start, request.end)
        .at(Stage::Fetch)?;
    debug!(rows = table.len(), columns = ?table.column_names(), "fetched");

    let series = table
        .select(&request.column)
        .and_then(|s| s.sanitized(request.missing_values))
        .at(Stage::ColumnSelection)?;
    if series.len() < table.len() {
        warn!(
            dropped = table.len() - series.len(),
            policy = %request.missing_values,
            "rows with missing values removed"
        );
    }

    let adf = adf_test(series.values(), None).at(Stage::Stationarity)?;
    let stationary = adf.is_stationary();
    info!(statistic = adf.statistic, p_value = adf.p_value, stationary, "stationarity tested");

    let decomposition = ClassicalDecomposition::new(request.decomposition_period)
        .decompose(&series)
        .at(Stage::Decomposition)?;
    debug!(
        trend_strength = decomposition.trend_strength(),
        seasonal_strength = decomposition.seasonal_strength(),
        "decomposed"
    );

    let spec = request.parameters.to_spec();
    let mut model = SARIMA::new(spec);
    model.fit(&series).at(Stage::ModelFit)?;
    let summary = model.summary().at(Stage::ModelFit)?;
    info!(model = %spec, aic = summary.aic, "model fitted");

    let forecast = forecast(&model, request.horizon_days, request.end).at(Stage::Forecast)?;
    let comparison = ActualVsPredicted::align(&series, &forecast);
    info!(points = forecast.len(), "pipeline finished");

    Ok(PipelineReport {
        request: request.clone(),
        table,
        series,
        adf,
        stationary,
        decomposition,
        summary,
        forecast,
        comparison,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PriceColumn, PriceTable};
    use crate::source::MemorySource;
    use chrono::Duration;
    use std::f64::consts::PI;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn source(n: usize) -> MemorySource {
        let start = date(2023, 1, 1);
        let dates: Vec<NaiveDate> = (0..n).map(|i| start + Duration::days(i as i64)).collect();
        let close: Vec<f64> = (0..n)
            .map(|i| {
                150.0 + 0.1 * i as f64
                    + 4.0 * (2.0 * PI * i as f64 / 12.0).sin()
                    + ((i * 7919) % 13) as f64 * 0.05
            })
            .collect();
        let open: Vec<f64> = close.iter().map(|c| c - 0.5).collect();
        let table = PriceTable::new(
            "AAPL",
            dates,
            vec![PriceColumn::new("Open", open), PriceColumn::new("Close", close)],
        )
        .unwrap();
        MemorySource::new().with_table(table)
    }

    fn request() -> PipelineRequest {
        let params = ModelParameters::new(1, 1, 1, 12).unwrap();
        PipelineRequest::new(Ticker::default(), date(2023, 1, 1), date(2023, 7, 1))
            .with_parameters(params)
    }

    #[test]
    fn pipeline_runs_every_stage() {
        let report = run_pipeline(&source(200), &request()).unwrap();

        assert_eq!(report.series.label(), Some("Close"));
        assert_eq!(report.series.len(), 181);
        assert_eq!(report.stationary, report.adf.p_value < 0.05);
        assert_eq!(report.decomposition.len(), 181);
        assert_eq!(report.summary.model, "SARIMAX(1, 1, 1)x(1, 1, 1, 12)");
        assert_eq!(report.forecast.len(), 11);
        assert_eq!(report.forecast.timestamps()[0].date_naive(), date(2023, 7, 1));
        // 181 observed dates and 11 forecast dates, none shared
        assert_eq!(report.comparison.rows().len(), 192);
    }

    #[test]
    fn fetch_failure_is_tagged() {
        let mut req = request();
        req.start = date(2030, 1, 1);
        req.end = date(2030, 2, 1);

        let err = run_pipeline(&source(50), &req).unwrap_err();
        assert_eq!(err.stage, Stage::Fetch);
        assert!(matches!(err.error, ForecastError::DataFetch(_)));
    }

    #[test]
    fn unknown_column_is_tagged() {
        let err = run_pipeline(&source(200), &request().with_column("Adj Close")).unwrap_err();
        assert_eq!(err.stage, Stage::ColumnSelection);
    }

    #[test]
    fn short_window_fails_at_decomposition() {
        let mut req = request();
        // 2023-01-01 .. 2023-04-10
        req.end = date(2023, 4, 11);
        req.decomposition_period = 60;

        let err = run_pipeline(&source(200), &req).unwrap_err();
        assert_eq!(err.stage, Stage::Decomposition);
        assert!(matches!(
            err.error,
            ForecastError::InsufficientData { needed: 120, got: 100 }
        ));
    }

    #[test]
    fn invalid_order_fails_at_model_fit() {
        let mut req = request();
        req.parameters = ModelParameters::new(1, 1, 1, 1).unwrap();

        let err = run_pipeline(&source(200), &req).unwrap_err();
        assert_eq!(err.stage, Stage::ModelFit);
        assert!(matches!(err.error, ForecastError::InvalidOrder(_)));
        assert!(err.to_string().starts_with("model fit stage failed"));
    }

    #[test]
    fn stage_names() {
        let names: Vec<&str> = Stage::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "fetch",
                "column selection",
                "stationarity",
                "decomposition",
                "model fit",
                "forecast"
            ]
        );
    }
}
