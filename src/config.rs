//! Dashboard configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Values are checked when the config is turned into a
//! [`PipelineRequest`].
//!
//! ```toml
//! ticker = "MSFT"
//! start = "2023-01-01"
//! end = "2024-01-31"
//! column = "Close"
//! horizon_days = 10
//! missing_values = "forward_fill"
//!
//! [model]
//! p = 2
//! d = 1
//! q = 2
//! seasonal_period = 12
//! seasonal = { p = 1, d = 1, q = 0 }
//! ```

use crate::core::MissingValuePolicy;
use crate::error::ForecastError;
use crate::models::ModelParameters;
use crate::pipeline::PipelineRequest;
use crate::source::Ticker;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a user can set on the dashboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub ticker: String,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    pub column: String,
    pub horizon_days: usize,
    pub missing_values: MissingValuePolicy,
    /// Directory holding `<SYMBOL>.csv` exports.
    pub data_dir: PathBuf,
    pub model: ModelConfig,
}

/// SARIMA orders. `seasonal` is optional; without it the seasonal part
/// repeats `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_period: usize,
    pub seasonal: Option<SeasonalOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            ticker: Ticker::default().to_string(),
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap_or_default(),
            column: "Close".to_string(),
            horizon_days: 10,
            missing_values: MissingValuePolicy::Error,
            data_dir: PathBuf::from("data"),
            model: ModelConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        let (p, d, q) = ModelParameters::default().order();
        Self {
            p,
            d,
            q,
            seasonal_period: ModelParameters::default().seasonal_period(),
            seasonal: None,
        }
    }
}

impl ModelConfig {
    /// Range-checked model parameters.
    pub fn parameters(&self) -> Result<ModelParameters, ConfigError> {
        let params = ModelParameters::new(self.p, self.d, self.q, self.seasonal_period)?;
        match self.seasonal {
            Some(s) => Ok(params.with_seasonal_override(s.p, s.d, s.q)?),
            None => Ok(params),
        }
    }
}

impl DashboardConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Check every value without building a request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_request().map(|_| ())
    }

    /// Validate and convert into a pipeline request.
    pub fn to_request(&self) -> Result<PipelineRequest, ConfigError> {
        let ticker: Ticker = self.ticker.parse()?;
        if self.start >= self.end {
            return Err(ConfigError::Invalid(format!(
                "start date {} must be before end date {}",
                self.start, self.end
            )));
        }
        if self.column.trim().is_empty() {
            return Err(ConfigError::Invalid("column must not be empty".to_string()));
        }
        let request = PipelineRequest::new(ticker, self.start, self.end)
            .with_column(self.column.trim())
            .with_parameters(self.model.parameters()?)
            .with_horizon(self.horizon_days)
            .with_missing_values(self.missing_values);
        Ok(request)
    }
}
