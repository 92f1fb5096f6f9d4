//! End-to-end tests for the forecasting pipeline.
//!
//! These tests drive the public API the same way the binary does: a price
//! table served by a source, a request, and the report that comes back.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use stock_forecast::core::{PriceColumn, PriceTable, TimeSeries};
use stock_forecast::error::ForecastError;
use stock_forecast::models::{forecast, Forecaster, ModelParameters, SARIMASpec, SARIMA};
use stock_forecast::pipeline::{run_pipeline, PipelineRequest, Stage};
use stock_forecast::seasonality::seasonal_decompose;
use stock_forecast::source::{MemorySource, Ticker};
use stock_forecast::validation::{adf_test, rejects_unit_root};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn daily_dates(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n).map(|i| start + Duration::days(i as i64)).collect()
}

/// Deterministic noise in [-1, 1).
fn noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        })
        .collect()
}

/// Sine with period 12 on top of a linear trend.
fn sine_plus_trend(n: usize) -> Vec<f64> {
    let e = noise(n, 7);
    (0..n)
        .map(|i| {
            120.0
                + 0.25 * i as f64
                + 6.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
                + 0.8 * e[i]
        })
        .collect()
}

fn make_series(start: NaiveDate, values: Vec<f64>) -> TimeSeries {
    TimeSeries::from_dates(&daily_dates(start, values.len()), values).unwrap()
}

fn source_with(symbol: &str, start: NaiveDate, close: Vec<f64>) -> MemorySource {
    let dates = daily_dates(start, close.len());
    let open: Vec<f64> = close.iter().map(|c| c * 0.99).collect();
    let table = PriceTable::new(
        symbol,
        dates,
        vec![PriceColumn::new("Open", open), PriceColumn::new("Close", close)],
    )
    .unwrap();
    MemorySource::new().with_table(table)
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[test]
fn year_of_sine_plus_trend_forecasts_eleven_days() {
    let start = date(2023, 1, 1);
    let end = start + Duration::days(365);
    let source = source_with("AAPL", start, sine_plus_trend(365));

    let request = PipelineRequest::new(Ticker::default(), start, end)
        .with_parameters(ModelParameters::new(1, 1, 1, 12).unwrap())
        .with_horizon(10);
    let report = run_pipeline(&source, &request).unwrap();

    assert_eq!(report.series.len(), 365);
    assert_eq!(report.forecast.len(), 11);
    assert_eq!(report.forecast.timestamps()[0].date_naive(), end);
    for pair in report.forecast.timestamps().windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::days(1));
    }
    assert!(report.forecast.predicted().iter().all(|v| v.is_finite()));
    assert_eq!(report.summary.model, "SARIMAX(1, 1, 1)x(1, 1, 1, 12)");
    assert_eq!(report.summary.nobs, 365);
}

#[test]
fn noise_free_sine_plus_trend_completes() {
    let start = date(2023, 1, 1);
    let end = start + Duration::days(365);
    let close: Vec<f64> = (0..365)
        .map(|i| 100.0 + 0.2 * i as f64 + 5.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin())
        .collect();
    let source = source_with("AAPL", start, close);

    let request = PipelineRequest::new(Ticker::default(), start, end)
        .with_parameters(ModelParameters::new(1, 1, 1, 12).unwrap())
        .with_horizon(10);
    let report = run_pipeline(&source, &request).unwrap();

    assert!(report.stationary);
    assert_eq!(report.forecast.len(), 11);
    assert_eq!(report.forecast.timestamps()[0].date_naive(), end);
    for pair in report.forecast.timestamps().windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::days(1));
    }
    assert!(report.forecast.predicted().iter().all(|v| v.is_finite()));
}

#[test]
fn forecast_follows_the_trend() {
    let start = date(2023, 1, 1);
    let values = sine_plus_trend(240);
    let last = values[values.len() - 1];
    let source = source_with("NVDA", start, values);

    let request = PipelineRequest::new(
        "nvda".parse().unwrap(),
        start,
        start + Duration::days(240),
    )
    .with_parameters(ModelParameters::new(1, 1, 1, 12).unwrap())
    .with_horizon(24);
    let report = run_pipeline(&source, &request).unwrap();

    let predicted = report.forecast.predicted();
    // the trend adds 0.25 per day; two seasonal cycles later the level is higher
    assert!(predicted[24] > last);
    assert!(predicted[24] - last < 15.0);
}

// =============================================================================
// Forecast length and dating
// =============================================================================

#[test]
fn forecast_returns_horizon_plus_one_points() {
    let series = make_series(date(2023, 1, 1), sine_plus_trend(120));
    let mut model = SARIMA::new(SARIMASpec::new(1, 1, 1));
    model.fit(&series).unwrap();

    let end = date(2023, 5, 1);
    for horizon in [0, 1, 10, 100] {
        let result = forecast(&model, horizon, end).unwrap();
        assert_eq!(result.len(), horizon + 1);
        assert_eq!(result.timestamps()[0].date_naive(), end);
        assert_eq!(
            result.timestamps()[horizon].date_naive(),
            end + Duration::days(horizon as i64)
        );
    }
}

#[test]
fn forecast_before_fit_is_an_error() {
    let model = SARIMA::new(SARIMASpec::new(1, 0, 0));
    assert_eq!(
        forecast(&model, 5, date(2024, 1, 1)).unwrap_err(),
        ForecastError::FitRequired
    );
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn refitting_is_deterministic() {
    let values: Vec<f64> = (0..60)
        .map(|i| 50.0 + 0.4 * i as f64 + ((i * 17) % 7) as f64 - 3.0)
        .collect();
    let series = make_series(date(2023, 3, 1), values);
    let spec = ModelParameters::new(1, 1, 1, 12).unwrap().to_spec();
    let end = date(2023, 4, 30);

    let run = || {
        let mut model = SARIMA::new(spec);
        model.fit(&series).unwrap();
        (model.params(), forecast(&model, 10, end).unwrap())
    };
    let (params_a, forecast_a) = run();
    let (params_b, forecast_b) = run();

    assert_eq!(params_a, params_b);
    assert_eq!(forecast_a, forecast_b);
}

// =============================================================================
// Decomposition
// =============================================================================

#[test]
fn decomposition_components_add_back_to_series() {
    let values = sine_plus_trend(96);
    let result = seasonal_decompose(&values, 12).unwrap();

    let mut checked = 0;
    for i in 0..values.len() {
        let (t, s, r) = (result.trend()[i], result.seasonal()[i], result.residual()[i]);
        if t.is_nan() || r.is_nan() {
            continue;
        }
        assert_relative_eq!(t + s + r, values[i], epsilon = 1e-9);
        checked += 1;
    }
    assert_eq!(checked, 96 - 12);
}

#[test]
fn short_series_cannot_be_decomposed() {
    let values = sine_plus_trend(23);
    assert_eq!(
        seasonal_decompose(&values, 12).unwrap_err(),
        ForecastError::InsufficientData { needed: 24, got: 23 }
    );
    assert!(seasonal_decompose(&sine_plus_trend(24), 12).is_ok());
}

// =============================================================================
// Stationarity decision
// =============================================================================

#[test]
fn stationarity_flag_matches_p_value() {
    let start = date(2023, 1, 1);
    let source = source_with("PEP", start, sine_plus_trend(200));
    let request = PipelineRequest::new("PEP".parse().unwrap(), start, start + Duration::days(200))
        .with_parameters(ModelParameters::new(1, 1, 0, 12).unwrap());
    let report = run_pipeline(&source, &request).unwrap();

    assert_eq!(report.stationary, report.adf.p_value < 0.05);
    assert!(!rejects_unit_root(0.05));
    assert!(rejects_unit_root(0.0499));

    let white = noise(200, 3);
    assert!(adf_test(&white, None).unwrap().is_stationary());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn failures_abort_with_their_stage() {
    let start = date(2023, 1, 1);
    let source = source_with("INTC", start, sine_plus_trend(100));

    let unknown = PipelineRequest::new("INTC".parse().unwrap(), date(2025, 1, 1), date(2025, 2, 1));
    let err = run_pipeline(&source, &unknown).unwrap_err();
    assert_eq!(err.stage, Stage::Fetch);

    let other_symbol = PipelineRequest::new("META".parse().unwrap(), start, date(2023, 3, 1));
    assert_eq!(run_pipeline(&source, &other_symbol).unwrap_err().stage, Stage::Fetch);

    let volume = PipelineRequest::new("INTC".parse().unwrap(), start, date(2023, 3, 1))
        .with_column("Volume");
    assert_eq!(
        run_pipeline(&source, &volume).unwrap_err().stage,
        Stage::ColumnSelection
    );
}
