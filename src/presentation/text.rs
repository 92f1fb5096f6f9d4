use crate::core::{ActualVsPredicted, ForecastResult, PriceTable, TimeSeries};
use crate::presentation::PresentationAdapter;
use crate::seasonality::DecompositionResult;
use chrono::{DateTime, Utc};
use std::io::{self, Write};

/// Plain-text page written to any [`Write`].
///
/// Long tables are elided to their first and last rows when a row limit is
/// set.
#[derive(Debug)]
pub struct TextRenderer<W: Write> {
    out: W,
    max_rows: Option<usize>,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            max_rows: None,
        }
    }

    /// Show at most `max_rows` rows per table.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows.max(2));
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn rows<F>(&mut self, n: usize, mut row: F) -> io::Result<()>
    where
        F: FnMut(&mut W, usize) -> io::Result<()>,
    {
        match self.max_rows {
            Some(limit) if n > limit => {
                let head = limit / 2;
                let tail = limit - head;
                for i in 0..head {
                    row(&mut self.out, i)?;
                }
                writeln!(self.out, "... ({} rows omitted)", n - limit)?;
                for i in n - tail..n {
                    row(&mut self.out, i)?;
                }
            }
            _ => {
                for i in 0..n {
                    row(&mut self.out, i)?;
                }
            }
        }
        Ok(())
    }
}

fn date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

fn cell(value: f64) -> String {
    if value.is_nan() {
        format!("{:>12}", "NaN")
    } else {
        format!("{:>12.4}", value)
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(cell).unwrap_or_else(|| format!("{:>12}", ""))
}

impl<W: Write> PresentationAdapter for TextRenderer<W> {
    fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "== {} ==", title)
    }

    fn table(&mut self, table: &PriceTable) -> io::Result<()> {
        write!(self.out, "{:<10}", "Date")?;
        for name in table.column_names() {
            write!(self.out, " {:>12}", name)?;
        }
        writeln!(self.out)?;

        let dates = table.dates();
        let columns = table.columns();
        self.rows(table.len(), |out, i| {
            write!(out, "{}", dates[i].format("%Y-%m-%d"))?;
            for column in columns {
                write!(out, " {}", cell(column.values()[i]))?;
            }
            writeln!(out)
        })
    }

    fn series(&mut self, title: &str, series: &TimeSeries) -> io::Result<()> {
        writeln!(self.out, "{:<10} {:>12}", "Date", title)?;
        let timestamps = series.timestamps();
        let values = series.values();
        self.rows(series.len(), |out, i| {
            writeln!(out, "{} {}", date(&timestamps[i]), cell(values[i]))
        })
    }

    fn decomposition(&mut self, decomposition: &DecompositionResult) -> io::Result<()> {
        writeln!(
            self.out,
            "period {}, trend strength {:.3}, seasonal strength {:.3}",
            decomposition.period(),
            decomposition.trend_strength(),
            decomposition.seasonal_strength()
        )?;
        writeln!(
            self.out,
            "{:<10} {:>12} {:>12} {:>12}",
            "Date", "Trend", "Seasonal", "Residual"
        )?;
        let timestamps = decomposition.timestamps();
        let (trend, seasonal, residual) = (
            decomposition.trend(),
            decomposition.seasonal(),
            decomposition.residual(),
        );
        self.rows(decomposition.len(), |out, i| {
            let label = timestamps
                .get(i)
                .map(date)
                .unwrap_or_else(|| i.to_string());
            writeln!(
                out,
                "{:<10} {} {} {}",
                label,
                cell(trend[i]),
                cell(seasonal[i]),
                cell(residual[i])
            )
        })
    }

    fn forecast(&mut self, title: &str, forecast: &ForecastResult) -> io::Result<()> {
        writeln!(
            self.out,
            "{:<10} {:>12} {:>12} {:>12}",
            "Date", title, "Lower 95%", "Upper 95%"
        )?;
        for row in forecast.rows() {
            writeln!(
                self.out,
                "{} {} {} {}",
                date(&row.timestamp),
                cell(row.predicted),
                optional(row.lower),
                optional(row.upper)
            )?;
        }
        Ok(())
    }

    fn comparison(&mut self, comparison: &ActualVsPredicted) -> io::Result<()> {
        writeln!(self.out, "{:<10} {:>12} {:>12}", "Date", "Actual", "Predicted")?;
        let rows = comparison.rows();
        self.rows(rows.len(), |out, i| {
            let row = &rows[i];
            writeln!(
                out,
                "{} {} {}",
                date(&row.timestamp),
                optional(row.actual),
                optional(row.predicted)
            )
        })
    }

    fn text(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    fn flag(&mut self, label: &str, value: bool) -> io::Result<()> {
        writeln!(self.out, "{}: {}", label, if value { "yes" } else { "no" })
    }
}
