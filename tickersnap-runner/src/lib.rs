//! Tickersnap Runner — one run across many tickers.
//!
//! This crate builds on `tickersnap-core` to provide:
//! - Run requests and TOML configuration
//! - Run-id allocation and the output directory layout
//! - The run manager with per-ticker failure isolation
//! - The aggregate `run_result.csv`
//! - Publishing a run as `latest` with a `LATEST_RUN.txt` pointer

pub mod config;
pub mod latest;
pub mod layout;
pub mod manager;
pub mod progress;
pub mod result;

pub use config::{ConfigError, RunRequest, SnapConfig};
pub use latest::{publish_latest, read_pointer, PublishError};
pub use layout::OutputLayout;
pub use manager::{RunError, RunManager, RunOutcome, TickerError};
pub use progress::{RunProgress, SilentProgress, StdoutProgress};
pub use result::{RunRecord, TickerResult, TickerStatus};
