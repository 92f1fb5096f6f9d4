//! Diagnostic summary of a fitted SARIMA model.

use crate::utils::stats::two_sided_p_value;
use crate::validation::{JarqueBeraResult, LjungBoxResult};
use chrono::{DateTime, Utc};
use std::fmt;

/// One row of the coefficient table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientRow {
    pub name: String,
    pub coef: f64,
    pub std_err: f64,
    /// `coef / std_err`
    pub z: f64,
    /// Two-sided normal p-value of `z`.
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

impl CoefficientRow {
    /// Row with 95% normal confidence bounds.
    pub fn new(name: impl Into<String>, coef: f64, std_err: f64) -> Self {
        let z = coef / std_err;
        Self {
            name: name.into(),
            coef,
            std_err,
            z,
            p_value: two_sided_p_value(z),
            ci_lower: coef - 1.96 * std_err,
            ci_upper: coef + 1.96 * std_err,
        }
    }
}

/// Fit statistics, coefficient table and residual diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    /// `SARIMAX(p, d, q)x(P, D, Q, s)`
    pub model: String,
    pub dependent: String,
    pub sample_start: Option<DateTime<Utc>>,
    pub sample_end: Option<DateTime<Utc>>,
    /// Observations in the fitted series.
    pub nobs: usize,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub hqic: f64,
    /// ARMA coefficients followed by `sigma2`.
    pub coefficients: Vec<CoefficientRow>,
    pub sigma2: f64,
    /// Ljung-Box Q at lag 1.
    pub ljung_box: LjungBoxResult,
    pub jarque_bera: JarqueBeraResult,
}

impl ModelSummary {
    pub fn coefficient(&self, name: &str) -> Option<&CoefficientRow> {
        self.coefficients.iter().find(|row| row.name == name)
    }
}

const RULE_WIDTH: usize = 78;

fn format_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%m-%d-%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "{:^width$}", "SARIMAX Results", width = RULE_WIDTH)?;
        writeln!(f, "{}", heavy)?;
        writeln!(
            f,
            "{:<14}{:>24}  {:<18}{:>20}",
            "Dep. Variable:", self.dependent, "No. Observations:", self.nobs
        )?;
        writeln!(
            f,
            "{:<14}{:>24}  {:<18}{:>20.3}",
            "Model:", self.model, "Log Likelihood", self.log_likelihood
        )?;
        writeln!(
            f,
            "{:<14}{:>24}  {:<18}{:>20.3}",
            "Sample:",
            format_date(self.sample_start),
            "AIC",
            self.aic
        )?;
        writeln!(
            f,
            "{:<14}{:>24}  {:<18}{:>20.3}",
            "",
            format!("- {}", format_date(self.sample_end)),
            "BIC",
            self.bic
        )?;
        writeln!(
            f,
            "{:<14}{:>24}  {:<18}{:>20.3}",
            "Covariance:", "numerical", "HQIC", self.hqic
        )?;
        writeln!(f, "{}", heavy)?;

        writeln!(
            f,
            "{:<14}{:>10}{:>10}{:>10}{:>10}{:>12}{:>12}",
            "", "coef", "std err", "z", "P>|z|", "[0.025", "0.975]"
        )?;
        writeln!(f, "{}", light)?;
        for row in &self.coefficients {
            writeln!(
                f,
                "{:<14}{:>10.4}{:>10.3}{:>10.3}{:>10.3}{:>12.3}{:>12.3}",
                row.name, row.coef, row.std_err, row.z, row.p_value, row.ci_lower, row.ci_upper
            )?;
        }
        writeln!(f, "{}", heavy)?;

        writeln!(
            f,
            "{:<24}{:>14.2}  {:<24}{:>14.2}",
            "Ljung-Box (L1) (Q):",
            self.ljung_box.statistic,
            "Jarque-Bera (JB):",
            self.jarque_bera.statistic
        )?;
        writeln!(
            f,
            "{:<24}{:>14.2}  {:<24}{:>14.2}",
            "Prob(Q):", self.ljung_box.p_value, "Prob(JB):", self.jarque_bera.p_value
        )?;
        writeln!(
            f,
            "{:<24}{:>14.2}  {:<24}{:>14.2}",
            "Skew:", self.jarque_bera.skewness, "Kurtosis:", self.jarque_bera.kurtosis
        )?;
        write!(f, "{}", heavy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn sample_summary() -> ModelSummary {
        ModelSummary {
            model: "SARIMAX(1, 1, 0)".to_string(),
            dependent: "Close".to_string(),
            sample_start: Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).single(),
            sample_end: Utc.with_ymd_and_hms(2023, 12, 29, 0, 0, 0).single(),
            nobs: 250,
            log_likelihood: -512.25,
            aic: 1028.5,
            bic: 1035.5,
            hqic: 1031.3,
            coefficients: vec![
                CoefficientRow::new("ar.L1", 0.5, 0.1),
                CoefficientRow::new("sigma2", 2.0, 0.2),
            ],
            sigma2: 2.0,
            ljung_box: LjungBoxResult {
                statistic: 0.12,
                p_value: 0.73,
                lags: 1,
                df: 1,
            },
            jarque_bera: JarqueBeraResult {
                statistic: 3.4,
                p_value: 0.18,
                skewness: 0.1,
                kurtosis: 3.5,
            },
        }
    }

    #[test]
    fn coefficient_row_statistics() {
        let row = CoefficientRow::new("ar.L1", 0.5, 0.1);
        assert_relative_eq!(row.z, 5.0, epsilon = 1e-12);
        assert!(row.p_value < 1e-5);
        assert_relative_eq!(row.ci_lower, 0.304, epsilon = 1e-12);
        assert_relative_eq!(row.ci_upper, 0.696, epsilon = 1e-12);

        let flat = CoefficientRow::new("ma.L1", 0.0, 0.3);
        assert_relative_eq!(flat.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn summary_report_lists_every_section() {
        let text = sample_summary().to_string();

        assert!(text.contains("SARIMAX Results"));
        assert!(text.contains("SARIMAX(1, 1, 0)"));
        assert!(text.contains("Close"));
        assert!(text.contains("01-03-2023"));
        assert!(text.contains("- 12-29-2023"));
        assert!(text.contains("HQIC"));
        assert!(text.contains("ar.L1"));
        assert!(text.contains("sigma2"));
        assert!(text.contains("Ljung-Box (L1) (Q):"));
        assert!(text.contains("Jarque-Bera (JB):"));
        assert!(text.contains("Kurtosis:"));
    }

    #[test]
    fn summary_coefficient_lookup() {
        let summary = sample_summary();
        assert_eq!(summary.coefficient("sigma2").map(|r| r.coef), Some(2.0));
        assert!(summary.coefficient("ma.L1").is_none());
    }
}
