use crate::common::func_util::check_same_len;
use crate::common::metric_error::MetricResult;
use crate::math::ema::ema;

/// Pointwise `fast - slow` of two aligned EMA series
pub fn ema_difference(fast_ema: &[f64], slow_ema: &[f64]) -> MetricResult<Vec<f64>> {
    check_same_len("macd", fast_ema, slow_ema)?;
    Ok(fast_ema
        .iter()
        .zip(slow_ema)
        .map(|(f, s)| f - s)
        .collect())
}

/// Moving average convergence divergence: `EMA(fast) - EMA(slow)`.
///
/// Window order is not enforced; swapping them negates the result.
pub fn macd(series: &[f64], fast: usize, slow: usize, adjust: bool) -> MetricResult<Vec<f64>> {
    let fast_ema = ema(series, fast, adjust)?;
    let slow_ema = ema(series, slow, adjust)?;
    ema_difference(&fast_ema, &slow_ema)
}
