use crate::common::metric_error::{ErrCode, MetricError, MetricResult};

/// Reject a zero window; every rolling metric needs at least one observation.
pub fn check_window(window: usize, what: &str) -> MetricResult<()> {
    if window == 0 {
        return Err(MetricError::new(
            format!("{what}: window must be positive"),
            ErrCode::InvalidWindow,
        ));
    }
    Ok(())
}

pub fn check_same_len(what: &str, left: &[f64], right: &[f64]) -> MetricResult<()> {
    if left.len() != right.len() {
        return Err(MetricError::length_mismatch(what, left.len(), right.len()));
    }
    Ok(())
}

/// Last observation of a series
pub fn last_value(series: &[f64], what: &str) -> MetricResult<f64> {
    series.last().copied().ok_or_else(|| {
        MetricError::new(format!("{what}: empty series"), ErrCode::DomainError)
    })
}

/// Population (n) mean and standard deviation
pub fn population_mean_std(series: &[f64]) -> Option<(f64, f64)> {
    if series.is_empty() {
        return None;
    }
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}
