//! Per-ticker outcomes and the aggregate `run_result.csv`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tickersnap_core::export::{write_records, ExportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TickerStatus {
    Success,
    Failure,
}

impl fmt::Display for TickerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickerStatus::Success => f.write_str("SUCCESS"),
            TickerStatus::Failure => f.write_str("FAILURE"),
        }
    }
}

/// Outcome of one ticker within a run. Created once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerResult {
    ticker: String,
    status: TickerStatus,
    error_message: Option<String>,
    output_dir: PathBuf,
}

impl TickerResult {
    pub fn success(ticker: &str, output_dir: PathBuf) -> Self {
        Self {
            ticker: ticker.to_string(),
            status: TickerStatus::Success,
            error_message: None,
            output_dir,
        }
    }

    pub fn failure(ticker: &str, output_dir: PathBuf, message: impl Into<String>) -> Self {
        Self {
            ticker: ticker.to_string(),
            status: TickerStatus::Failure,
            error_message: Some(message.into()),
            output_dir,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn status(&self) -> TickerStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == TickerStatus::Success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// The ticker's directory inside the run directory. For a failed fetch
    /// the directory is never created.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// One row of `run_result.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResultRow {
    pub ticker: String,
    pub status: TickerStatus,
    pub message: String,
}

impl From<&TickerResult> for RunResultRow {
    fn from(result: &TickerResult) -> Self {
        Self {
            ticker: result.ticker.clone(),
            status: result.status,
            message: result.error_message.clone().unwrap_or_default(),
        }
    }
}

/// A run: its id, its directory and the ticker outcomes in request order.
#[derive(Debug, Clone)]
pub struct RunRecord {
    run_id: String,
    base_dir: PathBuf,
    results: Vec<TickerResult>,
}

impl RunRecord {
    pub fn new(run_id: String, base_dir: PathBuf) -> Self {
        Self {
            run_id,
            base_dir,
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: TickerResult) {
        self.results.push(result);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn results(&self) -> &[TickerResult] {
        &self.results
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Write `ticker,status,message`, one row per result, header always present.
    pub fn write_result_csv(&self, path: &Path) -> Result<(), ExportError> {
        if self.results.is_empty() {
            return write_header_only(path);
        }
        write_records(path, self.results.iter().map(RunResultRow::from))
    }
}

// csv only emits the header alongside the first serialized record.
fn write_header_only(path: &Path) -> Result<(), ExportError> {
    std::fs::write(path, "ticker,status,message\n").map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
