//! # stock-forecast
//!
//! Command-line dashboard: runs the forecasting pipeline on CSV price
//! exports and prints the page as text.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use stock_forecast::config::{DashboardConfig, SeasonalOrder};
use stock_forecast::core::MissingValuePolicy;
use stock_forecast::pipeline::Session;
use stock_forecast::presentation::{render_error, render_report, TextRenderer};
use stock_forecast::source::CsvSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stock-forecast")]
#[command(about = "Stationarity, decomposition and SARIMA forecasts for daily stock prices", long_about = None)]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding <SYMBOL>.csv exports
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Ticker symbol
    #[arg(short, long)]
    ticker: Option<String>,

    /// First date of the window (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End of the window, exclusive (YYYY-MM-DD); also the first forecast date
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Price column to model
    #[arg(short, long)]
    column: Option<String>,

    /// Autoregressive order
    #[arg(short)]
    p: Option<usize>,

    /// Differencing order
    #[arg(short)]
    d: Option<usize>,

    /// Moving average order
    #[arg(short)]
    q: Option<usize>,

    /// Seasonal period
    #[arg(short = 's', long)]
    seasonal_period: Option<usize>,

    /// Seasonal autoregressive order (defaults to p)
    #[arg(long, requires_all = ["seasonal_d", "seasonal_q"])]
    seasonal_p: Option<usize>,

    /// Seasonal differencing order (defaults to d)
    #[arg(long, requires_all = ["seasonal_p", "seasonal_q"])]
    seasonal_d: Option<usize>,

    /// Seasonal moving average order (defaults to q)
    #[arg(long, requires_all = ["seasonal_p", "seasonal_d"])]
    seasonal_q: Option<usize>,

    /// Days to forecast past the end date
    #[arg(long)]
    horizon: Option<usize>,

    /// Handling of missing values in the selected column
    #[arg(long, value_enum)]
    missing_values: Option<PolicyArg>,

    /// Also print the separate actual and predicted plots
    #[arg(long)]
    show_plots: bool,

    /// Rows shown per table; 0 shows everything
    #[arg(long, default_value = "20")]
    max_rows: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Error,
    Drop,
    ForwardFill,
}

impl From<PolicyArg> for MissingValuePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Error => MissingValuePolicy::Error,
            PolicyArg::Drop => MissingValuePolicy::Drop,
            PolicyArg::ForwardFill => MissingValuePolicy::ForwardFill,
        }
    }
}

impl Cli {
    fn apply(self, mut config: DashboardConfig) -> DashboardConfig {
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(ticker) = self.ticker {
            config.ticker = ticker;
        }
        if let Some(start) = self.start {
            config.start = start;
        }
        if let Some(end) = self.end {
            config.end = end;
        }
        if let Some(column) = self.column {
            config.column = column;
        }
        if let Some(p) = self.p {
            config.model.p = p;
        }
        if let Some(d) = self.d {
            config.model.d = d;
        }
        if let Some(q) = self.q {
            config.model.q = q;
        }
        if let Some(s) = self.seasonal_period {
            config.model.seasonal_period = s;
        }
        if let (Some(p), Some(d), Some(q)) = (self.seasonal_p, self.seasonal_d, self.seasonal_q) {
            config.model.seasonal = Some(SeasonalOrder { p, d, q });
        }
        if let Some(horizon) = self.horizon {
            config.horizon_days = horizon;
        }
        if let Some(policy) = self.missing_values {
            config.missing_values = policy.into();
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stock_forecast=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    let show_plots = cli.show_plots;
    let max_rows = cli.max_rows;
    let config = cli.apply(config);
    let request = config.to_request().context("invalid dashboard settings")?;

    let source = CsvSource::new(&config.data_dir);
    info!(data_dir = %source.dir().display(), "reading price exports");

    let mut session = Session::new();
    if show_plots {
        session.show_plots();
    }
    session.run(&source, &request);

    let stdout = io::stdout();
    let mut renderer = TextRenderer::new(stdout.lock());
    if max_rows > 0 {
        renderer = renderer.with_max_rows(max_rows);
    }

    match session.latest() {
        Some(Ok(report)) => {
            render_report(&mut renderer, report, session.plot_visibility())
                .context("writing report")?;
        }
        Some(Err(err)) => {
            render_error(&mut renderer, err).context("writing report")?;
            renderer.into_inner().flush()?;
            return Err(anyhow::Error::new(err.clone()).context("forecast failed"));
        }
        None => anyhow::bail!("run result was not published"),
    }
    renderer.into_inner().flush()?;
    Ok(())
}
