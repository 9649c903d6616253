//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! First value at index period-1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// Create an SMA over `period` bars. A zero period is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("MA{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut result = vec![None; n];

        if n < self.period {
            return result;
        }

        let mut sum: f64 = bars[..self.period].iter().map(|b| b.close).sum();
        result[self.period - 1] = window_mean(sum, self.period);

        for i in self.period..n {
            let leaving = bars[i - self.period].close;
            let entering = bars[i].close;

            if leaving.is_finite() && entering.is_finite() && sum.is_finite() {
                sum = sum - leaving + entering;
            } else {
                // A NaN left or entered the window: rescan instead of rolling.
                sum = bars[(i + 1 - self.period)..=i].iter().map(|b| b.close).sum();
            }

            result[i] = window_mean(sum, self.period);
        }

        result
    }
}

fn window_mean(sum: f64, period: usize) -> Option<f64> {
    let mean = sum / period as f64;
    mean.is_finite().then_some(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};
    use proptest::prelude::*;

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&bars);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_none(), "expected no value at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4].unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(result[5].unwrap(), 13.0, DEFAULT_EPSILON);
        assert_approx(result[6].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).compute(&bars);
        assert_eq!(result, vec![Some(100.0), Some(200.0), Some(300.0)]);
    }

    #[test]
    fn sma_nan_propagation() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        bars[2].close = f64::NAN;
        let result = Sma::new(3).compute(&bars);
        // Windows containing index 2 have no value
        assert!(result[2].is_none());
        assert!(result[3].is_none());
        assert!(result[4].is_none());
        // Index 5 window [13,14,15] → 14.0
        assert_approx(result[5].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_name_and_period() {
        assert_eq!(Sma::new(25).name(), "MA25");
        assert_eq!(Sma::new(5).name(), "MA5");
        assert_eq!(Sma::new(0).period(), 1);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let result = Sma::new(5).compute(&bars);
        assert!(result.iter().all(|v| v.is_none()));
    }

    proptest! {
        #[test]
        fn defined_exactly_from_lookback(
            closes in prop::collection::vec(1.0f64..10_000.0, 0..80),
            period in 1usize..30,
        ) {
            let bars = make_bars(&closes);
            let result = Sma::new(period).compute(&bars);
            prop_assert_eq!(result.len(), closes.len());
            for (i, v) in result.iter().enumerate() {
                prop_assert_eq!(v.is_some(), i + 1 >= period);
            }
        }

        #[test]
        fn value_is_window_mean(
            closes in prop::collection::vec(1.0f64..10_000.0, 30..60),
            period in 1usize..30,
        ) {
            let bars = make_bars(&closes);
            let result = Sma::new(period).compute(&bars);
            let last = closes.len() - 1;
            let expected: f64 = closes[(last + 1 - period)..].iter().sum::<f64>() / period as f64;
            prop_assert!((result[last].unwrap() - expected).abs() < 1e-6);
        }
    }
}
