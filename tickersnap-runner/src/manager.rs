//! Drives one run end to end.
//!
//! For each ticker, in request order: fetch → derive → write CSVs → render.
//! Any failure in that chain is caught here, recorded as a FAILURE row and
//! the run continues with the next ticker. Only setup problems (no output
//! directory) and failures to write the run's own bookkeeping are fatal.

use crate::config::RunRequest;
use crate::latest::{publish_latest, PublishError};
use crate::layout::{
    base_run_id, OutputLayout, TickerDirs, PRICE_HISTORY_FILE, PRICE_MA_CHART,
    PRICE_VOLUME_CHART, RUN_RESULT_FILE, SUMMARY_FILE,
};
use crate::progress::{RunProgress, SilentProgress};
use crate::result::{RunRecord, TickerResult};
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tickersnap_core::export::{self, ExportError};
use tickersnap_core::{
    ChartRenderer, DataError, DataProvider, DerivedSeries, FetchResult, RenderError,
};
use tracing::{debug, info, warn};

/// Errors that fail a single ticker. Never fatal to the run.
#[derive(Debug, Error)]
pub enum TickerError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("failed to create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort the run (non-zero exit).
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot create run directory under {}: {source}", .root.display())]
    CreateOutputDir {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write run results: {0}")]
    WriteResults(#[source] ExportError),

    #[error("failed to publish latest: {0}")]
    PublishLatest(#[from] PublishError),
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub record: RunRecord,
    /// Set when the request asked for `--latest` and the mirror was published.
    pub latest_dir: Option<PathBuf>,
}

/// Orchestrates a run across the request's tickers.
pub struct RunManager<'a> {
    provider: &'a dyn DataProvider,
    renderer: &'a dyn ChartRenderer,
    layout: OutputLayout,
    progress: &'a dyn RunProgress,
}

impl<'a> RunManager<'a> {
    pub fn new(
        provider: &'a dyn DataProvider,
        renderer: &'a dyn ChartRenderer,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            renderer,
            layout: OutputLayout::new(output_root),
            progress: &SilentProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn RunProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Execute the request with a run id stamped from the local clock.
    pub fn run(&self, request: &RunRequest) -> Result<RunOutcome, RunError> {
        self.run_at(request, &Local::now())
    }

    /// Execute the request with a run id stamped from `started_at`.
    pub fn run_at<Tz>(
        &self,
        request: &RunRequest,
        started_at: &DateTime<Tz>,
    ) -> Result<RunOutcome, RunError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let base_id = base_run_id(started_at, request.run_name());
        let (run_id, base_dir) =
            self.layout
                .claim_run_dir(&base_id)
                .map_err(|source| RunError::CreateOutputDir {
                    root: self.layout.root().to_path_buf(),
                    source,
                })?;

        info!(
            run_id = %run_id,
            dir = %base_dir.display(),
            provider = self.provider.name(),
            tickers = request.tickers().len(),
            period = %request.period(),
            interval = %request.interval(),
            "run started"
        );

        let mut record = RunRecord::new(run_id, base_dir);
        let total = request.tickers().len();
        let mut dirs = TickerDirs::new();

        for (index, ticker) in request.tickers().iter().enumerate() {
            self.progress.on_start(ticker, index, total);

            let dir = record.base_dir().join(dirs.assign(ticker));
            let result = match self.process_ticker(request, ticker, &dir) {
                Ok(()) => {
                    info!(ticker = %ticker, "ticker complete");
                    TickerResult::success(ticker, dir)
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "ticker failed");
                    TickerResult::failure(ticker, dir, e.to_string())
                }
            };

            self.progress.on_complete(&result, index, total);
            record.push(result);
        }

        record
            .write_result_csv(&record.base_dir().join(RUN_RESULT_FILE))
            .map_err(RunError::WriteResults)?;
        self.progress.on_run_complete(&record);

        let latest_dir = if request.latest() {
            let dir = publish_latest(&self.layout, record.run_id(), record.base_dir())?;
            info!(run_id = record.run_id(), dir = %dir.display(), "published latest");
            Some(dir)
        } else {
            None
        };

        info!(
            run_id = record.run_id(),
            succeeded = record.succeeded(),
            failed = record.failed(),
            "run finished"
        );

        Ok(RunOutcome { record, latest_dir })
    }

    fn process_ticker(
        &self,
        request: &RunRequest,
        ticker: &str,
        dir: &Path,
    ) -> Result<(), TickerError> {
        let fetched = self
            .provider
            .fetch(ticker, request.period(), request.interval())?;
        let FetchResult { symbol, bars } = fetched;
        if bars.is_empty() {
            return Err(DataError::DataUnavailable {
                symbol: ticker.to_string(),
                period: request.period(),
                interval: request.interval(),
            }
            .into());
        }
        debug!(ticker, %symbol, rows = bars.len(), "fetched");

        let derived = DerivedSeries::from_bars(&bars);

        std::fs::create_dir_all(dir).map_err(|source| TickerError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        export::write_price_history(&dir.join(PRICE_HISTORY_FILE), &bars)?;
        export::write_summary(&dir.join(SUMMARY_FILE), ticker, &bars)?;
        self.renderer
            .render_price_ma(&dir.join(PRICE_MA_CHART), ticker, &bars, &derived)?;
        self.renderer
            .render_price_volume(&dir.join(PRICE_VOLUME_CHART), ticker, &bars, &derived)?;

        Ok(())
    }
}
