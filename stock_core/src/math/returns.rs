use crate::common::metric_error::{ErrCode, MetricError, MetricResult};

/// Fractional change from the previous observation; the first entry is
/// undefined.
pub fn pct_change(series: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    if !series.is_empty() {
        out.push(f64::NAN);
    }
    out.extend(series.windows(2).map(|w| w[1] / w[0] - 1.0));
    out
}

/// Cumulative returns of an adjusted close series, seeded at 1.0.
///
/// `r[i] = r[i - 1] * (1 + pct_change[i])`. An undefined change leaves an
/// undefined entry without resetting the running product.
pub fn cumulative_returns(adj_close: &[f64]) -> MetricResult<Vec<f64>> {
    if adj_close.is_empty() {
        return Err(MetricError::new(
            "cumulative returns need at least one observation",
            ErrCode::DomainError,
        ));
    }

    let mut product = 1.0;
    let mut out: Vec<f64> = pct_change(adj_close)
        .into_iter()
        .map(|change| {
            if change.is_nan() {
                f64::NAN
            } else {
                product *= 1.0 + change;
                product
            }
        })
        .collect();
    out[0] = 1.0;
    Ok(out)
}
