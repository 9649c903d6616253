//! Indicators computed over a fetched bar series.
//!
//! Output vectors are aligned 1:1 with the input bars. Entries without enough
//! history are `None` rather than a sentinel value, so CSV and chart code can
//! skip them without guessing.

pub mod sma;

pub use sma::Sma;

use crate::domain::Bar;

/// A single-series indicator over bars.
pub trait Indicator {
    /// Short name used in legends (e.g. `MA5`).
    fn name(&self) -> &str;

    /// Compute the indicator, one entry per input bar.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;
}

/// Create bars from close prices for testing.
///
/// open = previous close (or close for the first bar), high/low = max/min of
/// open and close ± 1.0, volume = 1000, one bar per calendar day.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
