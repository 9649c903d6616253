//! Tickersnap CLI — fetch a list of tickers and write CSVs and charts into a
//! timestamped run directory.
//!
//! ```text
//! tickersnap --tickers 7203.T,6758.T --period 1y --run-name weekly --latest
//! ```
//!
//! Exits 0 once the run completes, even if some tickers failed; the per-ticker
//! outcome is in `<run dir>/run_result.csv`. Non-zero means the run itself
//! could not happen (no tickers, bad config, unwritable output directory).

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tickersnap_core::{Interval, Period, PlottersRenderer, YahooProvider};
use tickersnap_runner::layout::RUN_RESULT_FILE;
use tickersnap_runner::{RunManager, RunRequest, SnapConfig, StdoutProgress};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tickersnap",
    version,
    about = "Tickersnap — stock price snapshots as CSVs and charts"
)]
struct Cli {
    /// Comma-separated tickers (e.g. 7203.T,6758.T,AAPL).
    #[arg(long)]
    tickers: String,

    /// History length: 1d 5d 1mo 3mo 6mo 1y 2y 5y 10y ytd max. Defaults to 6mo.
    #[arg(long)]
    period: Option<Period>,

    /// Bar size: 1d 1wk 1mo. Defaults to 1d.
    #[arg(long)]
    interval: Option<Interval>,

    /// Suffix appended to the run id.
    #[arg(long)]
    run_name: Option<String>,

    /// Also mirror the run into <output>/latest and update LATEST_RUN.txt.
    #[arg(long, default_value_t = false)]
    latest: bool,

    /// Output root. Defaults to ./output.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

/// Everything the run needs once flags, config file and defaults are merged.
#[derive(Debug)]
struct Settings {
    request: RunRequest,
    output_dir: PathBuf,
    chart_width: u32,
    chart_height: u32,
    timeout: Duration,
}

impl Cli {
    /// Flags win over the config file, which wins over built-in defaults.
    fn settings(&self, config: SnapConfig) -> Result<Settings> {
        let request = RunRequest::from_ticker_list(
            &self.tickers,
            self.period.unwrap_or(config.defaults.period),
            self.interval.unwrap_or(config.defaults.interval),
            self.run_name.as_deref(),
            self.latest,
        )?;

        Ok(Settings {
            request,
            output_dir: self.output_dir.clone().unwrap_or(config.output_dir),
            chart_width: config.chart.width,
            chart_height: config.chart.height,
            timeout: Duration::from_secs(config.http.timeout_secs),
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => SnapConfig::from_file(path)?,
        None => SnapConfig::default(),
    };
    let settings = cli.settings(config)?;

    let provider = YahooProvider::new(settings.timeout)?;
    let renderer = PlottersRenderer::new(settings.chart_width, settings.chart_height);
    let progress = StdoutProgress;

    let manager = RunManager::new(&provider, &renderer, &settings.output_dir)
        .with_progress(&progress);
    let outcome = manager
        .run(&settings.request)
        .context("run aborted")?;

    let record = &outcome.record;
    println!("Run id: {}", record.run_id());
    println!("Output saved to: {}", record.base_dir().display());
    if let Some(latest) = &outcome.latest_dir {
        println!("Latest: {}", latest.display());
    }
    println!(
        "Per-ticker results: {}",
        record.base_dir().join(RUN_RESULT_FILE).display()
    );

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
