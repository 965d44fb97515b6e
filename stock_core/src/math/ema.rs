use crate::common::func_util::check_window;
use crate::common::metric_error::MetricResult;

/// Exponentially weighted mean with decay `alpha = 2 / (span + 1)`.
///
/// With `adjust` set, each output is the weighted average of all
/// observations so far with weights `(1 - alpha)^i`, normalized by their sum.
/// Without it, the plain recursion `y = alpha * x + (1 - alpha) * y_prev` is
/// used. Both start at the first defined observation, so `EMA[0] == x[0]`.
///
/// An undefined input after the first observation leaves the mean unchanged
/// while the older weights keep decaying.
#[derive(Debug, Clone)]
pub struct EmaModel {
    alpha: f64,
    adjust: bool,
    numerator: f64,
    denominator: f64,
    last: Option<f64>,
}

impl EmaModel {
    pub fn new(span: usize, adjust: bool) -> Self {
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
            adjust,
            numerator: 0.0,
            denominator: 0.0,
            last: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn add(&mut self, value: f64) -> Option<f64> {
        let decay = 1.0 - self.alpha;
        let last = match self.last {
            None if value.is_nan() => return None,
            None => {
                self.numerator = value;
                self.denominator = 1.0;
                self.last = Some(value);
                return self.last;
            }
            Some(last) => last,
        };

        let next = if self.adjust {
            self.numerator *= decay;
            self.denominator *= decay;
            if !value.is_nan() {
                self.numerator += value;
                self.denominator += 1.0;
            }
            self.numerator / self.denominator
        } else if value.is_nan() {
            last
        } else {
            self.alpha * value + decay * last
        };

        self.last = Some(next);
        self.last
    }
}

/// Exponential moving average of `series` with smoothing `span`
pub fn ema(series: &[f64], span: usize, adjust: bool) -> MetricResult<Vec<f64>> {
    check_window(span, "exponential moving average")?;
    let mut model = EmaModel::new(span, adjust);
    Ok(series
        .iter()
        .map(|&x| model.add(x).unwrap_or(f64::NAN))
        .collect())
}
