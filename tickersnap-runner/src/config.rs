//! Configuration: the optional TOML file and the immutable per-run request.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tickersnap_core::{Interval, Period};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no tickers supplied (pass --tickers AAA,BBB)")]
    NoTickers,

    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value {key} = {value}: must be greater than zero")]
    NotPositive { key: &'static str, value: u64 },
}

/// Settings loaded from `--config <file>`. Every key is optional.
///
/// ```toml
/// output_dir = "output"
///
/// [defaults]
/// period = "6mo"
/// interval = "1d"
///
/// [chart]
/// width = 1000
/// height = 500
///
/// [http]
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapConfig {
    pub output_dir: PathBuf,
    pub defaults: DefaultsConfig,
    pub chart: ChartConfig,
    pub http: HttpConfig,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            defaults: DefaultsConfig::default(),
            chart: ChartConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl SnapConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Zero sizes or a zero timeout would fail every ticker, so refuse them up front.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("chart.width", u64::from(self.chart.width)),
            ("chart.height", u64::from(self.chart.height)),
            ("http.timeout_secs", self.http.timeout_secs),
        ];
        match checks.into_iter().find(|&(_, value)| value == 0) {
            Some((key, value)) => Err(ConfigError::NotPositive { key, value }),
            None => Ok(()),
        }
    }
}

/// Fetch window used when `--period` / `--interval` are not given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub period: Period,
    pub interval: Interval,
}

/// Output image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// One invocation's worth of work. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    tickers: Vec<String>,
    period: Period,
    interval: Interval,
    run_name: Option<String>,
    latest: bool,
}

impl RunRequest {
    /// Build a request, rejecting an empty ticker list.
    ///
    /// Tickers keep their order; duplicates are allowed. `run_name` is
    /// sanitised for use in a directory name and dropped if nothing is left.
    pub fn new(
        tickers: Vec<String>,
        period: Period,
        interval: Interval,
        run_name: Option<&str>,
        latest: bool,
    ) -> Result<Self, ConfigError> {
        let tickers: Vec<String> = tickers
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }

        Ok(Self {
            tickers,
            period,
            interval,
            run_name: run_name.and_then(sanitize_run_name),
            latest,
        })
    }

    /// Build a request from the comma-separated `--tickers` value.
    pub fn from_ticker_list(
        tickers: &str,
        period: Period,
        interval: Interval,
        run_name: Option<&str>,
        latest: bool,
    ) -> Result<Self, ConfigError> {
        Self::new(parse_tickers(tickers), period, interval, run_name, latest)
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn run_name(&self) -> Option<&str> {
        self.run_name.as_deref()
    }

    pub fn latest(&self) -> bool {
        self.latest
    }
}

/// Split a comma-separated ticker list, trimming blanks and empty entries.
pub fn parse_tickers(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Keep ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_run_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}
