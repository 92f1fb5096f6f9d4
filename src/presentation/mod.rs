//! Rendering of pipeline results.
//!
//! A [`PresentationAdapter`] receives the page one element at a time;
//! [`render_report`] walks a [`PipelineReport`] in page order.
//! [`TextRenderer`] is the plain-text implementation used by the binary.

mod text;

pub use text::TextRenderer;

use crate::core::{ActualVsPredicted, ForecastResult, PriceTable, TimeSeries};
use crate::pipeline::{PipelineError, PipelineReport, PlotVisibility};
use crate::seasonality::DecompositionResult;
use std::io;

/// Sink for the elements of a dashboard page.
pub trait PresentationAdapter {
    /// Start a titled section.
    fn section(&mut self, title: &str) -> io::Result<()>;

    /// The full price table.
    fn table(&mut self, table: &PriceTable) -> io::Result<()>;

    /// A single labelled series.
    fn series(&mut self, title: &str, series: &TimeSeries) -> io::Result<()>;

    /// Trend, seasonal and residual components.
    fn decomposition(&mut self, decomposition: &DecompositionResult) -> io::Result<()>;

    /// Dated predictions.
    fn forecast(&mut self, title: &str, forecast: &ForecastResult) -> io::Result<()>;

    /// Actual history and predictions on one date axis.
    fn comparison(&mut self, comparison: &ActualVsPredicted) -> io::Result<()>;

    /// Free text such as the model summary.
    fn text(&mut self, text: &str) -> io::Result<()>;

    /// A labelled yes/no answer.
    fn flag(&mut self, label: &str, value: bool) -> io::Result<()>;
}

/// Render a complete report in page order.
pub fn render_report<A>(
    adapter: &mut A,
    report: &PipelineReport,
    visibility: PlotVisibility,
) -> io::Result<()>
where
    A: PresentationAdapter + ?Sized,
{
    let request = &report.request;
    let column = report.series.label().unwrap_or(&request.column);

    adapter.section(&format!("{} price data", request.ticker))?;
    adapter.text(&format!("Data from {} to {}", request.start, request.end))?;
    adapter.table(&report.table)?;

    adapter.section("Selected data")?;
    adapter.series(column, &report.series)?;

    adapter.section("Is data stationary?")?;
    adapter.flag("Stationary (ADF p < 0.05)", report.stationary)?;
    adapter.text(&format!(
        "ADF statistic {:.4}, p-value {:.4}, lags {}, critical values 1% {:.3} / 5% {:.3} / 10% {:.3}",
        report.adf.statistic,
        report.adf.p_value,
        report.adf.used_lag,
        report.adf.critical_values.cv_1pct,
        report.adf.critical_values.cv_5pct,
        report.adf.critical_values.cv_10pct,
    ))?;

    adapter.section("Decomposition of data")?;
    adapter.decomposition(&report.decomposition)?;

    adapter.section("Model parameters")?;
    let (p, d, q) = request.parameters.order();
    let (sp, sd, sq, s) = request.parameters.seasonal_order();
    adapter.text(&format!(
        "order = ({}, {}, {}), seasonal order = ({}, {}, {}, {}), horizon = {} days",
        p, d, q, sp, sd, sq, s, request.horizon_days
    ))?;

    adapter.section("Model summary")?;
    adapter.text(&report.summary.to_string())?;

    adapter.section("Forecasting the data")?;
    adapter.forecast("Predictions", &report.forecast)?;
    adapter.series("Actual data", &report.series)?;
    adapter.comparison(&report.comparison)?;

    if visibility.is_shown() {
        adapter.section("Separate plots")?;
        adapter.series("Actual", &report.series)?;
        adapter.forecast("Predicted", &report.forecast)?;
    }
    Ok(())
}

/// Render a failed run.
pub fn render_error<A>(adapter: &mut A, error: &PipelineError) -> io::Result<()>
where
    A: PresentationAdapter + ?Sized,
{
    adapter.section(&format!("Failed at {}", error.stage))?;
    adapter.text(&error.error.to_string())
}
