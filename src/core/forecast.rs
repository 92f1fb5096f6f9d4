//! Forecast containers: raw step-ahead predictions and date-indexed results.

use crate::core::time_series::{midnight_utc, TimeSeries};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Step-ahead point predictions with optional prediction intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        for bound in [&lower, &upper] {
            if bound.len() != values.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: values.len(),
                    got: bound.len(),
                });
            }
        }
        Ok(Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Attach a daily date index starting at `anchor`.
    ///
    /// The first prediction is stamped with `anchor` itself, the next with
    /// `anchor + 1 day`, and so on.
    pub fn with_daily_index(self, anchor: NaiveDate) -> ForecastResult {
        let start = midnight_utc(anchor);
        let timestamps = (0..self.point.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        ForecastResult {
            timestamps,
            forecast: self,
        }
    }
}

/// Date-indexed out-of-sample predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    timestamps: Vec<DateTime<Utc>>,
    forecast: Forecast,
}

/// One row of a [`ForecastResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRow {
    pub timestamp: DateTime<Utc>,
    pub predicted: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn predicted(&self) -> &[f64] {
        self.forecast.point()
    }

    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    pub fn rows(&self) -> impl Iterator<Item = ForecastRow> + '_ {
        self.timestamps.iter().enumerate().map(move |(i, &timestamp)| ForecastRow {
            timestamp,
            predicted: self.forecast.point[i],
            lower: self.forecast.lower.as_ref().map(|l| l[i]),
            upper: self.forecast.upper.as_ref().map(|u| u[i]),
        })
    }
}

/// Actual history and predictions merged on a shared date axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ActualVsPredicted {
    rows: Vec<ComparisonRow>,
}

/// A date with the observed and/or predicted value at that date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRow {
    pub timestamp: DateTime<Utc>,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
}

impl ActualVsPredicted {
    /// Merge both series on the union of their timestamps, in date order.
    pub fn align(actual: &TimeSeries, predicted: &ForecastResult) -> Self {
        let mut merged: BTreeMap<DateTime<Utc>, ComparisonRow> = BTreeMap::new();

        for (timestamp, value) in actual.iter() {
            merged.insert(
                timestamp,
                ComparisonRow {
                    timestamp,
                    actual: Some(value),
                    predicted: None,
                },
            );
        }

        for row in predicted.rows() {
            merged
                .entry(row.timestamp)
                .or_insert(ComparisonRow {
                    timestamp: row.timestamp,
                    actual: None,
                    predicted: None,
                })
                .predicted = Some(row.predicted);
        }

        Self {
            rows: merged.into_values().collect(),
        }
    }

    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    /// Dates where both an observation and a prediction exist.
    pub fn overlap(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows
            .iter()
            .filter(|r| r.actual.is_some() && r.predicted.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn forecast_from_values_reports_horizon() {
        let forecast = Forecast::from_values(vec![1.0, 2.0, 3.0]);
        assert_eq!(forecast.horizon(), 3);
        assert!(!forecast.is_empty());
        assert!(!forecast.has_intervals());
        assert!(Forecast::new().is_empty());
    }

    #[test]
    fn forecast_intervals_must_match_points() {
        let ok = Forecast::from_values_with_intervals(
            vec![2.0, 3.0],
            vec![1.0, 2.0],
            vec![3.0, 4.0],
        )
        .unwrap();
        assert_eq!(ok.lower(), Some(&[1.0, 2.0][..]));
        assert_eq!(ok.upper(), Some(&[3.0, 4.0][..]));

        let bad = Forecast::from_values_with_intervals(vec![2.0, 3.0], vec![1.0], vec![3.0, 4.0]);
        assert!(matches!(bad, Err(ForecastError::DimensionMismatch { .. })));
    }

    #[test]
    fn daily_index_starts_at_anchor() {
        let result = Forecast::from_values(vec![10.0, 11.0, 12.0]).with_daily_index(date(2024, 1, 31));

        assert_eq!(result.len(), 3);
        assert_eq!(
            result.timestamps()[0],
            Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            result.timestamps()[2],
            Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap()
        );

        let rows: Vec<_> = result.rows().collect();
        assert_eq!(rows[1].predicted, 11.0);
        assert!(rows[1].lower.is_none());
    }

    #[test]
    fn comparison_merges_on_union_of_dates() {
        let actual = TimeSeries::from_dates(
            &[date(2024, 1, 29), date(2024, 1, 30), date(2024, 1, 31)],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();
        let predicted = Forecast::from_values(vec![3.5, 4.0]).with_daily_index(date(2024, 1, 31));

        let comparison = ActualVsPredicted::align(&actual, &predicted);
        let rows = comparison.rows();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].actual, Some(1.0));
        assert_eq!(rows[0].predicted, None);
        assert_eq!(rows[2].actual, Some(3.0));
        assert_eq!(rows[2].predicted, Some(3.5));
        assert_eq!(rows[3].actual, None);
        assert_eq!(rows[3].predicted, Some(4.0));
        assert_eq!(comparison.overlap().count(), 1);
    }
}
