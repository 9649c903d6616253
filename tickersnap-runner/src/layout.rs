//! Output tree layout and run-id allocation.
//!
//! ```text
//! <output>/<run_id>/<ticker>/price_history.csv
//! <output>/<run_id>/<ticker>/summary.csv
//! <output>/<run_id>/<ticker>/price_ma.png
//! <output>/<run_id>/<ticker>/price_volume.png
//! <output>/<run_id>/run_result.csv
//! <output>/latest/...          mirror of the newest --latest run
//! <output>/LATEST_RUN.txt      run_id of that run
//! ```
//!
//! File names are part of the external contract and must not change.

use chrono::{DateTime, TimeZone};
use std::collections::HashMap;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

pub const PRICE_HISTORY_FILE: &str = "price_history.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const PRICE_MA_CHART: &str = "price_ma.png";
pub const PRICE_VOLUME_CHART: &str = "price_volume.png";
pub const RUN_RESULT_FILE: &str = "run_result.csv";
pub const LATEST_DIR: &str = "latest";
pub const LATEST_POINTER_FILE: &str = "LATEST_RUN.txt";

/// Timestamp part of a run id, second precision.
pub const RUN_ID_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Give up after this many same-second collisions.
const MAX_RUN_ID_ATTEMPTS: u32 = 1000;

/// Paths under one output root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id)
    }

    pub fn latest_dir(&self) -> PathBuf {
        self.root.join(LATEST_DIR)
    }

    pub fn latest_pointer(&self) -> PathBuf {
        self.root.join(LATEST_POINTER_FILE)
    }

    /// Create the output root and claim a fresh run directory.
    ///
    /// The directory is created non-recursively, so an existing directory
    /// with the same id is detected rather than reused; `-2`, `-3`, ... is
    /// appended until creation succeeds.
    pub fn claim_run_dir(&self, base_id: &str) -> io::Result<(String, PathBuf)> {
        std::fs::create_dir_all(&self.root)?;

        for attempt in 1..=MAX_RUN_ID_ATTEMPTS {
            let run_id = if attempt == 1 {
                base_id.to_string()
            } else {
                format!("{base_id}-{attempt}")
            };
            let dir = self.run_dir(&run_id);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok((run_id, dir)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free run directory for '{base_id}' after {MAX_RUN_ID_ATTEMPTS} attempts"),
        ))
    }
}

/// `YYYYmmdd_HHMMSS`, or `YYYYmmdd_HHMMSS_<run_name>` when a name is given.
pub fn base_run_id<Tz>(started_at: &DateTime<Tz>, run_name: Option<&str>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let ts = started_at.format(RUN_ID_TIME_FORMAT);
    match run_name {
        Some(name) => format!("{ts}_{name}"),
        None => ts.to_string(),
    }
}

/// Directory name for a ticker: anything outside `[A-Za-z0-9._^=-]` becomes `_`,
/// and names made only of dots are prefixed so they cannot mean `.` or `..`.
pub fn ticker_dir_name(ticker: &str) -> String {
    let name: String = ticker
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '^' | '=' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.chars().all(|c| c == '.') {
        format!("_{name}")
    } else {
        name
    }
}

/// Hands out ticker directory names within one run.
///
/// Distinct tickers that sanitize to the same name (`BRK/B`, `BRK_B`) get
/// `-2`, `-3`, ... so neither overwrites the other. Repeats of the same
/// ticker share their directory.
#[derive(Debug, Default)]
pub struct TickerDirs {
    owners: HashMap<String, String>,
}

impl TickerDirs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, ticker: &str) -> String {
        let base = ticker_dir_name(ticker);
        let mut name = base.clone();
        let mut n = 1;
        loop {
            match self.owners.get(&name) {
                Some(owner) if owner == ticker => return name,
                Some(_) => {
                    n += 1;
                    name = format!("{base}-{n}");
                }
                None => {
                    self.owners.insert(name.clone(), ticker.to_string());
                    return name;
                }
            }
        }
    }
}
