//! Yahoo Finance data provider.
//!
//! Fetches OHLCV bars from Yahoo's v8 chart API using the `range` and
//! `interval` query tokens. Prices are auto-adjusted with the adjusted-close
//! ratio and timestamps are mapped to exchange-local calendar dates.
//!
//! One request per symbol, no retries: a failed symbol is reported to the
//! caller and the run carries on with the next one.

use super::canonicalize::canonicalize;
use super::provider::{DataError, DataProvider, FetchResult, Interval, Period};
use crate::domain::Bar;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
/// Used when a 429 carries no usable `Retry-After` seconds value.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Build the chart API URL for a symbol. The symbol is percent-encoded
    /// as a single path segment, so `^N225` or `BRK/B` cannot escape it.
    fn chart_url(&self, symbol: &str) -> Result<reqwest::Url, DataError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| DataError::Client(format!("invalid base url '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| DataError::Client(format!("base url '{}' cannot take a path", self.base_url)))?
            .push(symbol);
        Ok(url)
    }

    /// Parse the chart API response into bars (unsorted, possibly empty).
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A valid symbol with no trading in the window comes back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let gmtoffset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + gmtoffset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);

            // Skip placeholder rows (holidays, halted sessions)
            let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
                continue;
            };

            let adj_close = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());
            let ratio = match adj_close {
                Some(adj) if adj.is_finite() && close > 0.0 => adj / close,
                _ => 1.0,
            };

            let bar = Bar {
                date,
                open: open * ratio,
                high: high * ratio,
                low: low * ratio,
                close: close * ratio,
                volume,
            };
            if !bar.is_sane() {
                debug!(symbol, %date, "dropping malformed bar");
                continue;
            }
            bars.push(bar);
        }

        Ok(bars)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<FetchResult, DataError> {
        let url = self.chart_url(symbol)?;
        debug!(%url, %period, %interval, "requesting chart");

        let resp = self
            .client
            .get(url)
            .query(&[
                ("range", period.as_str()),
                ("interval", interval.as_str()),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        check_status(symbol, resp.status(), resp.headers())?;

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let bars = canonicalize(Self::parse_response(symbol, chart)?);
        if bars.is_empty() {
            return Err(DataError::DataUnavailable {
                symbol: symbol.to_string(),
                period,
                interval,
            });
        }

        debug!(symbol, rows = bars.len(), "chart parsed");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
        })
    }
}

/// Map a non-success HTTP status to the matching `DataError`.
fn check_status(symbol: &str, status: StatusCode, headers: &HeaderMap) -> Result<(), DataError> {
    if status == StatusCode::NOT_FOUND {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(DataError::RateLimited { retry_after_secs });
    }

    if !status.is_success() {
        return Err(DataError::Http {
            symbol: symbol.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(())
}
