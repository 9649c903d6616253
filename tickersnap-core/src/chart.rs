//! PNG chart rendering.
//!
//! Two charts per ticker:
//! - close price with the short and long moving averages
//! - close price against volume bars on a secondary axis
//!
//! The x axis is the bar index, so non-trading days leave no gaps; tick labels
//! are the bar dates, thinned to at most `DEFAULT_MAX_TICKS` labels.

use crate::domain::Bar;
use crate::series::{format_tick, DerivedSeries};
use plotters::coord::combinators::{BindKeyPoints, WithKeyPoints};
use plotters::coord::types::RangedCoordi32;
use plotters::prelude::*;
use std::fmt::Display;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Upper bound on x-axis date labels per chart.
pub const DEFAULT_MAX_TICKS: usize = 10;

const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot render an empty series")]
    EmptySeries,

    #[error("series length mismatch: {bars} bars but {derived} derived values")]
    LengthMismatch { bars: usize, derived: usize },

    #[error("failed to draw {}: {message}", .path.display())]
    Draw { path: PathBuf, message: String },
}

/// Renders the per-ticker chart images.
///
/// The run pipeline only depends on this trait, so tests can substitute a
/// renderer that does not need fonts or a bitmap encoder.
pub trait ChartRenderer {
    /// Close price with short/long moving-average overlays.
    fn render_price_ma(
        &self,
        path: &Path,
        ticker: &str,
        bars: &[Bar],
        derived: &DerivedSeries,
    ) -> Result<(), RenderError>;

    /// Close price (left axis) against scaled volume bars (right axis).
    fn render_price_volume(
        &self,
        path: &Path,
        ticker: &str,
        bars: &[Bar],
        derived: &DerivedSeries,
    ) -> Result<(), RenderError>;
}

/// Indices that receive a date label: every `ceil(len / max_ticks)`-th bar.
pub fn tick_indices(len: usize, max_ticks: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let step = len.div_ceil(max_ticks.max(1));
    (0..len).step_by(step).collect()
}

/// Bitmap renderer backed by plotters.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    width: u32,
    height: u32,
}

impl PlottersRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn x_axis(len: usize) -> WithKeyPoints<RangedCoordi32> {
        let ticks: Vec<i32> = tick_indices(len, DEFAULT_MAX_TICKS)
            .into_iter()
            .map(|i| i as i32)
            .collect();
        (0..len as i32).with_key_points(ticks)
    }
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self::new(1000, 500)
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render_price_ma(
        &self,
        path: &Path,
        ticker: &str,
        bars: &[Bar],
        derived: &DerivedSeries,
    ) -> Result<(), RenderError> {
        check_series(bars, derived)?;
        debug!(ticker, path = %path.display(), "rendering price/MA chart");

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err(path))?;

        let y_range = value_range(
            bars.iter()
                .map(|b| b.close)
                .chain(derived.ma_short.iter().flatten().copied())
                .chain(derived.ma_long.iter().flatten().copied()),
        );
        let tick_count = tick_indices(bars.len(), DEFAULT_MAX_TICKS).len();
        let date_label = |idx: &i32| date_at(bars, *idx);

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{ticker} Close Price"), CAPTION_FONT)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(Self::x_axis(bars.len()), y_range)
            .map_err(draw_err(path))?;

        chart
            .configure_mesh()
            .x_labels(tick_count)
            .x_label_formatter(&date_label)
            .x_desc("Date")
            .y_desc("Close")
            .draw()
            .map_err(draw_err(path))?;

        chart
            .draw_series(LineSeries::new(
                bars.iter().enumerate().map(|(i, b)| (i as i32, b.close)),
                &BLACK,
            ))
            .map_err(draw_err(path))?
            .label("Close")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

        for (values, color, name) in [
            (&derived.ma_short, RED, &derived.ma_short_name),
            (&derived.ma_long, BLUE, &derived.ma_long_name),
        ] {
            if values.iter().all(Option::is_none) {
                continue;
            }
            chart
                .draw_series(LineSeries::new(
                    values
                        .iter()
                        .enumerate()
                        .filter_map(|(i, v)| v.map(|v| (i as i32, v))),
                    &color,
                ))
                .map_err(draw_err(path))?
                .label(name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err(path))?;

        root.present().map_err(draw_err(path))?;
        Ok(())
    }

    fn render_price_volume(
        &self,
        path: &Path,
        ticker: &str,
        bars: &[Bar],
        derived: &DerivedSeries,
    ) -> Result<(), RenderError> {
        check_series(bars, derived)?;
        debug!(ticker, path = %path.display(), "rendering price/volume chart");

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err(path))?;

        let n = bars.len() as i32;
        let volumes = derived.scaled_volumes(bars);
        let v_max = volumes.iter().copied().fold(0.0, f64::max);
        let v_top = if v_max > 0.0 { v_max * 1.1 } else { 1.0 };
        let y_range = value_range(bars.iter().map(|b| b.close));
        let tick_count = tick_indices(bars.len(), DEFAULT_MAX_TICKS).len();
        let date_label = |idx: &i32| date_at(bars, *idx);
        let volume_label = |v: &f64| format_tick(*v);

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{ticker} Close & Volume"), CAPTION_FONT)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .right_y_label_area_size(70)
            .build_cartesian_2d(Self::x_axis(bars.len()), y_range)
            .map_err(draw_err(path))?
            .set_secondary_coord(0..n, 0.0..v_top);

        chart
            .configure_mesh()
            .x_labels(tick_count)
            .x_label_formatter(&date_label)
            .x_desc("Date")
            .y_desc("Close")
            .draw()
            .map_err(draw_err(path))?;

        chart
            .configure_secondary_axes()
            .y_desc(derived.volume_scale.axis_label())
            .y_label_formatter(&volume_label)
            .draw()
            .map_err(draw_err(path))?;

        // Volume first so the price line stays on top.
        chart
            .draw_secondary_series(volumes.iter().enumerate().map(|(i, v)| {
                let x = i as i32;
                Rectangle::new([(x, 0.0), (x + 1, *v)], BLUE.mix(0.3).filled())
            }))
            .map_err(draw_err(path))?;

        chart
            .draw_series(LineSeries::new(
                bars.iter().enumerate().map(|(i, b)| (i as i32, b.close)),
                &BLACK,
            ))
            .map_err(draw_err(path))?;

        root.present().map_err(draw_err(path))?;
        Ok(())
    }
}

fn check_series(bars: &[Bar], derived: &DerivedSeries) -> Result<(), RenderError> {
    if bars.is_empty() {
        return Err(RenderError::EmptySeries);
    }
    for len in [derived.ma_short.len(), derived.ma_long.len()] {
        if len != bars.len() {
            return Err(RenderError::LengthMismatch {
                bars: bars.len(),
                derived: len,
            });
        }
    }
    Ok(())
}

fn draw_err<E: Display>(path: &Path) -> impl Fn(E) -> RenderError + '_ {
    move |e| RenderError::Draw {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn date_at(bars: &[Bar], idx: i32) -> String {
    usize::try_from(idx)
        .ok()
        .and_then(|i| bars.get(i))
        .map(|b| b.date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Padded min..max over the finite values; a flat series gets a small band.
fn value_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo {
        (hi - lo) * 0.05
    } else {
        lo.abs().max(1.0) * 0.05
    };
    (lo - pad)..(hi + pad)
}
