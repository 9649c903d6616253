//! Derived series for charting: short/long moving averages and volume scaling.

use crate::domain::Bar;
use crate::indicators::{Indicator, Sma};

/// Short moving-average window (bars).
pub const SHORT_MA_PERIOD: usize = 5;
/// Long moving-average window (bars).
pub const LONG_MA_PERIOD: usize = 25;

/// Unit used for the volume axis so labels stay short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeScale {
    Raw,
    TenThousands,
    HundredMillions,
}

impl VolumeScale {
    /// Pick the unit from the largest volume in the series.
    pub fn for_max_volume(max_volume: u64) -> Self {
        if max_volume > 100_000_000 {
            VolumeScale::HundredMillions
        } else if max_volume > 10_000 {
            VolumeScale::TenThousands
        } else {
            VolumeScale::Raw
        }
    }

    pub fn for_bars(bars: &[Bar]) -> Self {
        Self::for_max_volume(bars.iter().map(|b| b.volume).max().unwrap_or(0))
    }

    pub fn divisor(&self) -> f64 {
        match self {
            VolumeScale::Raw => 1.0,
            VolumeScale::TenThousands => 1e4,
            VolumeScale::HundredMillions => 1e8,
        }
    }

    /// Caption for the volume axis.
    pub fn axis_label(&self) -> &'static str {
        match self {
            VolumeScale::Raw => "Volume",
            VolumeScale::TenThousands => "Volume (x10^4)",
            VolumeScale::HundredMillions => "Volume (x10^8)",
        }
    }

    pub fn scale(&self, volume: u64) -> f64 {
        volume as f64 / self.divisor()
    }

    /// Scaled value as a tick label: at most two decimals, trailing zeros trimmed.
    pub fn format(&self, volume: u64) -> String {
        format_tick(self.scale(volume))
    }
}

/// Format an axis value with at most two decimals and no trailing zeros.
pub fn format_tick(value: f64) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Series derived from the close prices and volumes of one ticker.
#[derive(Debug, Clone)]
pub struct DerivedSeries {
    pub ma_short: Vec<Option<f64>>,
    pub ma_long: Vec<Option<f64>>,
    /// Legend text for the short average (`MA5`).
    pub ma_short_name: String,
    /// Legend text for the long average (`MA25`).
    pub ma_long_name: String,
    pub volume_scale: VolumeScale,
}

impl DerivedSeries {
    /// Compute MA5, MA25 and the volume scale. Short histories give partial
    /// or absent averages, never an error.
    pub fn from_bars(bars: &[Bar]) -> Self {
        let short = Sma::new(SHORT_MA_PERIOD);
        let long = Sma::new(LONG_MA_PERIOD);
        Self {
            ma_short: short.compute(bars),
            ma_long: long.compute(bars),
            ma_short_name: short.name().to_string(),
            ma_long_name: long.name().to_string(),
            volume_scale: VolumeScale::for_bars(bars),
        }
    }

    /// Volumes divided by the selected unit, aligned with the bars.
    pub fn scaled_volumes(&self, bars: &[Bar]) -> Vec<f64> {
        bars.iter().map(|b| self.volume_scale.scale(b.volume)).collect()
    }
}
