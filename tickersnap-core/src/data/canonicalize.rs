//! Canonical ordering for fetched bars: ascending dates, one bar per date.

use crate::domain::Bar;

/// Sort bars ascending by date and collapse duplicate dates.
///
/// When a date appears more than once the last occurrence wins; the chart
/// API repeats the in-progress session as a trailing row during market hours.
pub fn canonicalize(mut bars: Vec<Bar>) -> Vec<Bar> {
    // Stable sort keeps the original order among equal dates.
    bars.sort_by_key(|b| b.date);

    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => out.push(bar),
        }
    }
    out
}
