use crate::common::func_util::check_window;
use crate::common::metric_error::MetricResult;
use crate::math::ma::sma;

/// One-step differences; the first entry is undefined
pub fn diff(series: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    if !series.is_empty() {
        out.push(f64::NAN);
    }
    out.extend(series.windows(2).map(|w| w[1] - w[0]));
    out
}

/// Map averaged gains and losses to an RSI value. No downward movement
/// saturates at 100.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        return f64::NAN;
    }
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// Relative strength index with simple moving averages of gains and losses.
///
/// Defined from index `window` on: the first delta is undefined, so the
/// first full window of deltas ends there.
pub fn rsi(series: &[f64], window: usize) -> MetricResult<Vec<f64>> {
    check_window(window, "rsi")?;
    let delta = diff(series);
    let up: Vec<f64> = delta
        .iter()
        .map(|&d| if d < 0.0 { 0.0 } else { d })
        .collect();
    let down: Vec<f64> = delta
        .iter()
        .map(|&d| if d > 0.0 { 0.0 } else { d.abs() })
        .collect();

    let avg_up = sma(&up, window)?;
    let avg_down = sma(&down, window)?;

    Ok(avg_up
        .iter()
        .zip(&avg_down)
        .map(|(&g, &l)| rsi_from_averages(g, l))
        .collect())
}
