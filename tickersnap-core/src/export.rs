//! CSV export: full price history and a one-row latest summary per ticker.
//!
//! Column names and order are a compatibility contract for downstream tools:
//! - `price_history.csv`: `Date,Open,High,Low,Close,Volume`
//! - `summary.csv`: `ticker,latest_date,open,high,low,close,volume`

use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no bars to export")]
    EmptySeries,

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// One row of `price_history.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
}

impl From<&Bar> for PriceRecord {
    fn from(bar: &Bar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// The single row of `summary.csv`: the most recent bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub ticker: String,
    pub latest_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl SummaryRecord {
    /// Summary of the last bar, or `None` for an empty series.
    pub fn latest(ticker: &str, bars: &[Bar]) -> Option<Self> {
        bars.last().map(|bar| Self {
            ticker: ticker.to_string(),
            latest_date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })
    }
}

/// Write every bar to `path`, one row per date, with a header.
pub fn write_price_history(path: &Path, bars: &[Bar]) -> Result<(), ExportError> {
    if bars.is_empty() {
        return Err(ExportError::EmptySeries);
    }
    write_records(path, bars.iter().map(PriceRecord::from))
}

/// Write the latest-bar summary to `path` and return it.
pub fn write_summary(path: &Path, ticker: &str, bars: &[Bar]) -> Result<SummaryRecord, ExportError> {
    let summary = SummaryRecord::latest(ticker, bars).ok_or(ExportError::EmptySeries)?;
    write_records(path, std::iter::once(summary.clone()))?;
    Ok(summary)
}

/// Serialize records with a header row derived from the record type.
pub fn write_records<T, I>(path: &Path, records: I) -> Result<(), ExportError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
