use std::collections::VecDeque;

use crate::common::func_util::check_window;
use crate::common::metric_error::MetricResult;

/// Trailing window over a series, tracking how many undefined values it holds
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
    nan_count: usize,
}

impl RollingWindow {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            values: VecDeque::with_capacity(period),
            nan_count: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        if value.is_nan() {
            self.nan_count += 1;
        }
        self.values.push_back(value);
        if self.values.len() > self.period {
            if let Some(old) = self.values.pop_front() {
                if old.is_nan() {
                    self.nan_count -= 1;
                }
            }
        }
    }

    /// Full window with no undefined values
    pub fn is_ready(&self) -> bool {
        self.values.len() == self.period && self.nan_count == 0
    }

    pub fn values(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

#[derive(Debug)]
pub struct MeanModel {
    window: RollingWindow,
}

impl MeanModel {
    pub fn new(period: usize) -> Self {
        Self {
            window: RollingWindow::new(period),
        }
    }

    pub fn add(&mut self, value: f64) -> Option<f64> {
        self.window.push(value);
        if !self.window.is_ready() {
            return None;
        }
        Some(self.window.values().sum::<f64>() / self.window.period() as f64)
    }
}

/// Simple moving average: mean of the trailing `window` observations
/// (inclusive). The first `window - 1` entries, and any window touching an
/// undefined input, are NaN.
pub fn sma(series: &[f64], window: usize) -> MetricResult<Vec<f64>> {
    check_window(window, "moving average")?;
    let mut model = MeanModel::new(window);
    Ok(series
        .iter()
        .map(|&x| model.add(x).unwrap_or(f64::NAN))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSE: [f64; 10] = [100.0, 102.0, 101.0, 105.0, 107.0, 106.0, 110.0, 108.0, 111.0, 115.0];

    #[test]
    fn test_sma_leading_undefined() {
        let ma = sma(&CLOSE, 3).unwrap();
        assert_eq!(ma.len(), CLOSE.len());
        assert!(ma[0].is_nan());
        assert!(ma[1].is_nan());
        assert_eq!(ma[2], 101.0);
    }

    #[test]
    fn test_sma_matches_window_mean() {
        let w = 4;
        let ma = sma(&CLOSE, w).unwrap();
        for i in (w - 1)..CLOSE.len() {
            let expected = CLOSE[i + 1 - w..=i].iter().sum::<f64>() / w as f64;
            assert!((ma[i] - expected).abs() < 1e-12, "index {i}");
        }
    }

    #[test]
    fn test_sma_window_longer_than_series() {
        let ma = sma(&CLOSE[..3], 5).unwrap();
        assert!(ma.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_sma_window_one_is_identity() {
        assert_eq!(sma(&CLOSE, 1).unwrap(), CLOSE.to_vec());
    }

    #[test]
    fn test_sma_nan_input_poisons_window() {
        let series = [f64::NAN, 1.0, 2.0, 3.0];
        let ma = sma(&series, 2).unwrap();
        assert!(ma[0].is_nan());
        assert!(ma[1].is_nan());
        assert_eq!(ma[2], 1.5);
        assert_eq!(ma[3], 2.5);
    }

    #[test]
    fn test_sma_zero_window() {
        assert!(sma(&CLOSE, 0).is_err());
    }
}
