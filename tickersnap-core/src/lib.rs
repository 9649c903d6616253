//! Tickersnap Core — everything that happens to a single ticker.
//!
//! - Domain types (`Bar`)
//! - Market data fetch behind the `DataProvider` trait (Yahoo Finance chart API)
//! - Derived series: MA5/MA25 and volume-axis scaling
//! - Chart rendering behind the `ChartRenderer` trait (plotters bitmaps)
//! - CSV export of the price history and latest-bar summary
//!
//! Run orchestration (directories, per-ticker outcomes, latest mirror) lives in
//! `tickersnap-runner`.

pub mod chart;
pub mod data;
pub mod domain;
pub mod export;
pub mod indicators;
pub mod series;

pub use chart::{ChartRenderer, PlottersRenderer, RenderError};
pub use data::{DataError, DataProvider, FetchResult, Interval, Period, YahooProvider};
pub use domain::Bar;
pub use export::{ExportError, PriceRecord, SummaryRecord};
pub use series::{DerivedSeries, VolumeScale};
