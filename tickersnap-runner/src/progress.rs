//! Progress callbacks for a run.

use crate::result::{RunRecord, TickerResult};

/// Progress callback for multi-ticker runs.
pub trait RunProgress {
    /// Called when starting to process a ticker.
    fn on_start(&self, ticker: &str, index: usize, total: usize);

    /// Called when a ticker's outcome has been recorded.
    fn on_complete(&self, result: &TickerResult, index: usize, total: usize);

    /// Called once the aggregate results file has been written.
    fn on_run_complete(&self, run: &RunRecord);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl RunProgress for StdoutProgress {
    fn on_start(&self, ticker: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {ticker}...", index + 1, total);
    }

    fn on_complete(&self, result: &TickerResult, _index: usize, _total: usize) {
        match result.error_message() {
            None => println!("  OK: {}", result.ticker()),
            Some(msg) => println!("  FAIL: {}: {msg}", result.ticker()),
        }
    }

    fn on_run_complete(&self, run: &RunRecord) {
        println!(
            "\nRun {} complete: {}/{} succeeded, {} failed",
            run.run_id(),
            run.succeeded(),
            run.results().len(),
            run.failed()
        );
    }
}

/// Reporter that prints nothing (library use, tests).
pub struct SilentProgress;

impl RunProgress for SilentProgress {
    fn on_start(&self, _ticker: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _result: &TickerResult, _index: usize, _total: usize) {}
    fn on_run_complete(&self, _run: &RunRecord) {}
}
