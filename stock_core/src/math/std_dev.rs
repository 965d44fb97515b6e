use crate::common::func_util::check_window;
use crate::common::metric_error::MetricResult;
use crate::math::ma::RollingWindow;

#[derive(Debug)]
pub struct StdDevModel {
    window: RollingWindow,
}

impl StdDevModel {
    pub fn new(period: usize) -> Self {
        Self {
            window: RollingWindow::new(period),
        }
    }

    /// Sample (n - 1) standard deviation of the current window
    pub fn add(&mut self, value: f64) -> Option<f64> {
        self.window.push(value);
        let n = self.window.period();
        if n < 2 || !self.window.is_ready() {
            return None;
        }

        let mean = self.window.values().sum::<f64>() / n as f64;
        let variance = self
            .window
            .values()
            .map(|&x| (x - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;

        Some(variance.sqrt())
    }
}

/// Rolling sample standard deviation over the trailing `window`
/// observations. Undefined for the first `window - 1` entries and
/// everywhere when `window < 2`.
pub fn rolling_std(series: &[f64], window: usize) -> MetricResult<Vec<f64>> {
    check_window(window, "rolling std")?;
    let mut model = StdDevModel::new(window);
    Ok(series
        .iter()
        .map(|&x| model.add(x).unwrap_or(f64::NAN))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_std_sample() {
        let sd = rolling_std(&[1.0, 2.0, 3.0, 4.0], 3).unwrap();
        assert!(sd[0].is_nan());
        assert!(sd[1].is_nan());
        assert!((sd[2] - 1.0).abs() < 1e-12);
        assert!((sd[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_std_constant_is_zero() {
        let sd = rolling_std(&[5.0; 6], 4).unwrap();
        assert!(sd[..3].iter().all(|v| v.is_nan()));
        assert!(sd[3..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rolling_std_window_one_undefined() {
        let sd = rolling_std(&[1.0, 2.0, 3.0], 1).unwrap();
        assert!(sd.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_rolling_std_known_value() {
        // 2, 4, 4, 4, 5, 5, 7, 9 has sample variance 32 / 7
        let series = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = rolling_std(&series, 8).unwrap();
        assert!((sd[7] - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }
}
