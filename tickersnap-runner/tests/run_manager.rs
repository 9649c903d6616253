//! End-to-end tests for the run manager using an in-memory provider and a
//! renderer stub, so no network or fonts are needed.

use chrono::{NaiveDate, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tickersnap_core::{
    Bar, ChartRenderer, DataError, DataProvider, DerivedSeries, FetchResult, Interval, Period,
    RenderError,
};
use tickersnap_runner::result::RunResultRow;
use tickersnap_runner::{read_pointer, RunError, RunManager, RunRequest, TickerStatus};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Serves canned bars; unknown symbols are "not found". Records call order.
struct TableProvider {
    table: HashMap<String, Vec<Bar>>,
    calls: RefCell<Vec<String>>,
}

impl TableProvider {
    fn new() -> Self {
        Self {
            table: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn with(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.table.insert(symbol.to_string(), bars);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl DataProvider for TableProvider {
    fn name(&self) -> &str {
        "table"
    }

    fn fetch(
        &self,
        symbol: &str,
        _period: Period,
        _interval: Interval,
    ) -> Result<FetchResult, DataError> {
        self.calls.borrow_mut().push(symbol.to_string());
        match self.table.get(symbol) {
            Some(bars) => Ok(FetchResult {
                symbol: symbol.to_string(),
                bars: bars.clone(),
            }),
            None => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
        }
    }
}

/// Writes a PNG signature instead of a real chart; can be told to fail.
#[derive(Default)]
struct StubRenderer {
    fail_for: Option<String>,
}

impl StubRenderer {
    fn write(&self, path: &Path, ticker: &str, bars: &[Bar]) -> Result<(), RenderError> {
        if bars.is_empty() {
            return Err(RenderError::EmptySeries);
        }
        if self.fail_for.as_deref() == Some(ticker) {
            return Err(RenderError::Draw {
                path: path.to_path_buf(),
                message: "backend exploded".into(),
            });
        }
        fs::write(path, PNG_MAGIC).unwrap();
        Ok(())
    }
}

impl ChartRenderer for StubRenderer {
    fn render_price_ma(
        &self,
        path: &Path,
        ticker: &str,
        bars: &[Bar],
        _derived: &DerivedSeries,
    ) -> Result<(), RenderError> {
        self.write(path, ticker, bars)
    }

    fn render_price_volume(
        &self,
        path: &Path,
        ticker: &str,
        bars: &[Bar],
        _derived: &DerivedSeries,
    ) -> Result<(), RenderError> {
        self.write(path, ticker, bars)
    }
}

fn daily_bars(n: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
    (0..n)
        .map(|i| {
            let close = 2_500.0 + i as f64 * 5.0;
            Bar {
                date: start + chrono::Duration::days(i as i64),
                open: close - 2.0,
                high: close + 10.0,
                low: close - 10.0,
                close,
                volume: 20_000_000 + i as u64 * 1_000,
            }
        })
        .collect()
}

fn request(tickers: &str, run_name: Option<&str>, latest: bool) -> RunRequest {
    RunRequest::from_ticker_list(tickers, Period::SixMonths, Interval::Daily, run_name, latest)
        .unwrap()
}

fn read_results(path: &Path) -> Vec<RunResultRow> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().map(|r| r.unwrap()).collect()
}

fn line_count(path: &Path) -> usize {
    fs::read_to_string(path).unwrap().lines().count()
}

#[test]
fn one_success_one_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = TableProvider::new().with("AAA", daily_bars(30));
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, tmp.path().join("output"));

    let outcome = manager.run(&request("AAA,BBB", None, false)).unwrap();
    let run_dir = outcome.record.base_dir().to_path_buf();

    let rows = read_results(&run_dir.join("run_result.csv"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].ticker, "AAA");
    assert_eq!(rows[0].status, TickerStatus::Success);
    assert_eq!(rows[0].message, "");
    assert_eq!(rows[1].ticker, "BBB");
    assert_eq!(rows[1].status, TickerStatus::Failure);
    assert!(!rows[1].message.is_empty());

    let aaa = run_dir.join("AAA");
    assert_eq!(line_count(&aaa.join("price_history.csv")), 31);
    assert_eq!(line_count(&aaa.join("summary.csv")), 2);
    assert_eq!(fs::read(aaa.join("price_ma.png")).unwrap(), PNG_MAGIC);
    assert_eq!(fs::read(aaa.join("price_volume.png")).unwrap(), PNG_MAGIC);

    assert!(!run_dir.join("BBB").exists(), "failed fetch must not leave a directory");
    assert!(outcome.latest_dir.is_none());
    assert!(!tmp.path().join("output/latest").exists());
    assert!(!tmp.path().join("output/LATEST_RUN.txt").exists());
}

#[test]
fn failure_does_not_stop_later_tickers() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = TableProvider::new()
        .with("CCC", daily_bars(10))
        .with("DDD", daily_bars(3));
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, tmp.path());

    let outcome = manager.run(&request("BAD1,CCC,BAD2,DDD", None, false)).unwrap();

    assert_eq!(provider.calls(), vec!["BAD1", "CCC", "BAD2", "DDD"]);
    let statuses: Vec<_> = outcome.record.results().iter().map(|r| r.status()).collect();
    assert_eq!(
        statuses,
        vec![
            TickerStatus::Failure,
            TickerStatus::Success,
            TickerStatus::Failure,
            TickerStatus::Success
        ]
    );
    assert_eq!(outcome.record.succeeded(), 2);
    assert_eq!(outcome.record.failed(), 2);
}

#[test]
fn one_row_per_ticker_in_input_order() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = TableProvider::new()
        .with("ZZZ", daily_bars(5))
        .with("AAA", daily_bars(5));
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, tmp.path());

    let outcome = manager.run(&request("ZZZ,AAA,ZZZ", None, false)).unwrap();
    let rows = read_results(&outcome.record.base_dir().join("run_result.csv"));
    let tickers: Vec<_> = rows.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["ZZZ", "AAA", "ZZZ"]);
}

#[test]
fn render_failure_is_recorded_not_raised() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = TableProvider::new()
        .with("AAA", daily_bars(30))
        .with("BBB", daily_bars(30));
    let renderer = StubRenderer {
        fail_for: Some("AAA".into()),
    };
    let manager = RunManager::new(&provider, &renderer, tmp.path());

    let outcome = manager.run(&request("AAA,BBB", None, false)).unwrap();
    let results = outcome.record.results();
    assert_eq!(results[0].status(), TickerStatus::Failure);
    let msg = results[0].error_message().unwrap();
    assert!(msg.contains("render failed"), "{msg}");
    assert!(msg.contains("backend exploded"), "{msg}");
    assert_eq!(results[1].status(), TickerStatus::Success);
}

#[test]
fn empty_series_from_provider_is_a_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = TableProvider::new().with("EMPTY", Vec::new());
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, tmp.path());

    let outcome = manager.run(&request("EMPTY", None, false)).unwrap();
    let result = &outcome.record.results()[0];
    assert_eq!(result.status(), TickerStatus::Failure);
    assert!(result.error_message().unwrap().contains("no data returned for EMPTY"));
    assert!(!result.output_dir().exists());
}

#[test]
fn latest_mirrors_run_and_records_run_id() {
    let tmp = tempfile::tempdir().unwrap();
    let output = tmp.path().join("output");
    let provider = TableProvider::new().with("7203.T", daily_bars(40));
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, &output);

    let outcome = manager.run(&request("7203.T", Some("jp"), true)).unwrap();
    let run_id = outcome.record.run_id().to_string();
    assert!(run_id.ends_with("_jp"), "{run_id}");

    let in_run = fs::read(output.join(&run_id).join("7203.T/summary.csv")).unwrap();
    let in_latest = fs::read(output.join("latest/7203.T/summary.csv")).unwrap();
    assert_eq!(in_run, in_latest);
    assert!(output.join("latest/run_result.csv").exists());
    assert_eq!(outcome.latest_dir.as_deref(), Some(output.join("latest").as_path()));

    let pointer = fs::read_to_string(output.join("LATEST_RUN.txt")).unwrap();
    assert_eq!(pointer.trim_end_matches('\n'), run_id);
}

#[test]
fn later_latest_run_replaces_earlier_one() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = TableProvider::new()
        .with("AAA", daily_bars(10))
        .with("BBB", daily_bars(12));
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, tmp.path());

    let t1 = Utc.with_ymd_and_hms(2024, 6, 3, 7, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 6, 4, 7, 0, 0).unwrap();
    manager.run_at(&request("AAA", None, true), &t1).unwrap();
    let second = manager.run_at(&request("BBB", None, true), &t2).unwrap();

    let latest = tmp.path().join("latest");
    assert!(!latest.join("AAA").exists());
    assert!(latest.join("BBB/summary.csv").exists());
    assert_eq!(
        read_pointer(&tmp.path().join("LATEST_RUN.txt")).as_deref(),
        Some(second.record.run_id())
    );
    assert_eq!(second.record.run_id(), "20240604_070000");
}

#[test]
fn same_second_runs_get_distinct_ids() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = TableProvider::new().with("AAA", daily_bars(5));
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, tmp.path());

    let t = Utc.with_ymd_and_hms(2024, 6, 3, 7, 5, 9).unwrap();
    let req = request("AAA", Some("daily"), false);
    let first = manager.run_at(&req, &t).unwrap();
    let second = manager.run_at(&req, &t).unwrap();

    assert_eq!(first.record.run_id(), "20240603_070509_daily");
    assert_eq!(second.record.run_id(), "20240603_070509_daily-2");
    assert!(first.record.base_dir().join("run_result.csv").exists());
    assert!(second.record.base_dir().join("run_result.csv").exists());
}

#[test]
fn unusable_output_root_is_fatal_before_any_fetch() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("output");
    fs::write(&root, b"a file, not a directory").unwrap();

    let provider = TableProvider::new().with("AAA", daily_bars(5));
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, &root);

    let err = manager.run(&request("AAA", None, false)).unwrap_err();
    assert!(matches!(err, RunError::CreateOutputDir { .. }), "{err}");
    assert!(provider.calls().is_empty());
}

#[test]
fn ticker_outputs_stay_inside_the_run_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = TableProvider::new().with("BRK/B", daily_bars(5));
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, tmp.path());

    let outcome = manager.run(&request("BRK/B", None, false)).unwrap();
    let result = &outcome.record.results()[0];
    assert_eq!(result.status(), TickerStatus::Success);
    assert_eq!(result.output_dir(), outcome.record.base_dir().join("BRK_B"));
    assert!(result.output_dir().join("summary.csv").exists());
}

#[test]
fn tickers_with_the_same_dir_name_do_not_overwrite_each_other() {
    let tmp = tempfile::tempdir().unwrap();
    let provider = TableProvider::new()
        .with("BRK/B", daily_bars(5))
        .with("BRK_B", daily_bars(8));
    let renderer = StubRenderer::default();
    let manager = RunManager::new(&provider, &renderer, tmp.path());

    let outcome = manager.run(&request("BRK/B,BRK_B", None, false)).unwrap();
    let base = outcome.record.base_dir();
    let results = outcome.record.results();

    assert_eq!(results[0].output_dir(), base.join("BRK_B"));
    assert_eq!(results[1].output_dir(), base.join("BRK_B-2"));
    assert_eq!(line_count(&base.join("BRK_B/price_history.csv")), 6);
    assert_eq!(line_count(&base.join("BRK_B-2/price_history.csv")), 9);
}
