//! TimeSeries data structure for a single selected price column.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Policy for handling missing values (NaN/Inf) in a selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Return an error if missing values are found.
    #[default]
    Error,
    /// Drop observations with missing values.
    Drop,
    /// Forward fill (use previous valid value). Leading gaps are dropped.
    ForwardFill,
}

impl fmt::Display for MissingValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingValuePolicy::Error => "error",
            MissingValuePolicy::Drop => "drop",
            MissingValuePolicy::ForwardFill => "forward_fill",
        };
        f.write_str(name)
    }
}

/// An ordered sequence of `(timestamp, value)` observations.
///
/// Timestamps are strictly increasing. Values may contain NaN until the
/// series is [`sanitized`](TimeSeries::sanitized); the statistical stages
/// reject series that still carry missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a series, validating lengths and timestamp order.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if values.len() != timestamps.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        if let Some(pos) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ForecastError::TimestampError(format!(
                "timestamps must be strictly increasing (at index {})",
                pos + 1
            )));
        }

        Ok(Self {
            timestamps,
            values,
            label: None,
        })
    }

    /// Create a series indexed by calendar days at midnight UTC.
    pub fn from_dates(dates: &[NaiveDate], values: Vec<f64>) -> Result<Self> {
        let timestamps = dates.iter().map(|d| midnight_utc(*d)).collect();
        Self::new(timestamps, values)
    }

    /// Attach a label (usually the source column name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Iterate over `(timestamp, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Extract observations in `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "slice end {} exceeds series length {}",
                end,
                self.len()
            )));
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            label: self.label.clone(),
        })
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Return a sanitized copy with missing values handled.
    pub fn sanitized(&self, policy: MissingValuePolicy) -> Result<TimeSeries> {
        match policy {
            MissingValuePolicy::Error => {
                if self.has_missing_values() {
                    return Err(ForecastError::MissingValues);
                }
                Ok(self.clone())
            }
            MissingValuePolicy::Drop => Ok(self.filtered(|_, v| v.is_finite())),
            MissingValuePolicy::ForwardFill => {
                let mut last_valid = None;
                let mut timestamps = Vec::with_capacity(self.len());
                let mut values = Vec::with_capacity(self.len());

                for (t, v) in self.iter() {
                    let filled = if v.is_finite() {
                        last_valid = Some(v);
                        Some(v)
                    } else {
                        last_valid
                    };
                    if let Some(v) = filled {
                        timestamps.push(t);
                        values.push(v);
                    }
                }

                Ok(TimeSeries {
                    timestamps,
                    values,
                    label: self.label.clone(),
                })
            }
        }
    }

    fn filtered<F>(&self, keep: F) -> TimeSeries
    where
        F: Fn(DateTime<Utc>, f64) -> bool,
    {
        let (timestamps, values): (Vec<_>, Vec<_>) = self.iter().filter(|&(t, v)| keep(t, v)).unzip();
        TimeSeries {
            timestamps,
            values,
            label: self.label.clone(),
        }
    }
}

/// Midnight UTC of a calendar date.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
