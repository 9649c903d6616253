//! Market data acquisition.

pub mod canonicalize;
pub mod provider;
pub mod yahoo;

pub use canonicalize::canonicalize;
pub use provider::{DataError, DataProvider, FetchResult, Interval, ParseTokenError, Period};
pub use yahoo::YahooProvider;
