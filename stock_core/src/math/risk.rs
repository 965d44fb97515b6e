use tracing::warn;

use crate::common::func_util::{check_same_len, last_value, population_mean_std};
use crate::common::metric_error::{ErrCode, MetricError, MetricResult};

/// A ratio whose denominator may be exactly zero. `None` marks the
/// undefined case, which is neither an error nor a numeric zero.
pub type Ratio = Option<f64>;

pub type CovMatrix = [[f64; 2]; 2];

/// Beta, alpha (in percent) and Sharpe of one return series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnMetrics {
    pub beta: Ratio,
    pub alpha: Ratio,
    pub sharpe: Ratio,
}

/// Population covariance matrix of two equal-length return series
pub fn covariance(returns: &[f64], baseline: &[f64]) -> MetricResult<CovMatrix> {
    check_same_len("covariance", returns, baseline)?;
    if returns.is_empty() {
        return Err(MetricError::new(
            "covariance of empty series",
            ErrCode::DomainError,
        ));
    }

    let n = returns.len() as f64;
    let mean_r = returns.iter().sum::<f64>() / n;
    let mean_b = baseline.iter().sum::<f64>() / n;

    let (mut rr, mut rb, mut bb) = (0.0, 0.0, 0.0);
    for (&r, &b) in returns.iter().zip(baseline) {
        let dr = r - mean_r;
        let db = b - mean_b;
        rr += dr * dr;
        rb += dr * db;
        bb += db * db;
    }

    Ok([[rr / n, rb / n], [rb / n, bb / n]])
}

/// Sensitivity of the returns to the baseline: `cov[0][1] / cov[1][1]`
pub fn beta(cov: &CovMatrix) -> Ratio {
    if cov[1][1] == 0.0 {
        warn!("baseline variance is zero, beta undefined");
        return None;
    }
    Some(cov[0][1] / cov[1][1])
}

/// Excess return over the baseline after beta, as a percentage
pub fn alpha(
    returns: &[f64],
    beta: f64,
    risk_free_rate: f64,
    baseline: &[f64],
) -> MetricResult<f64> {
    let stock_return = last_value(returns, "alpha returns")? - 1.0;
    let baseline_return = last_value(baseline, "alpha baseline")? - 1.0;
    let a = stock_return - risk_free_rate - beta * (baseline_return - risk_free_rate);
    Ok(a * 100.0)
}

/// Excess return per unit of population standard deviation of the returns
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> MetricResult<Ratio> {
    let excess = last_value(returns, "sharpe returns")? - 1.0 - risk_free_rate;
    let Some((_, std)) = population_mean_std(returns) else {
        return Ok(None);
    };
    if std == 0.0 {
        warn!("returns have zero volatility, sharpe ratio undefined");
        return Ok(None);
    }
    Ok(Some(excess / std))
}

/// Rate of the risk-free reference over its whole cumulative return series
pub fn risk_free_rate(risk_free_returns: &[f64]) -> MetricResult<f64> {
    Ok(last_value(risk_free_returns, "risk free returns")? - 1.0)
}

/// Beta, alpha and Sharpe for a stock against a baseline and a risk-free
/// reference. All three must be cumulative return series; the stock and
/// baseline must be aligned.
pub fn return_metrics(
    returns: &[f64],
    baseline: &[f64],
    risk_free_returns: &[f64],
) -> MetricResult<ReturnMetrics> {
    return_metrics_with_rate(returns, baseline, risk_free_rate(risk_free_returns)?)
}

/// Same as [`return_metrics`] with the risk-free rate given directly
pub fn return_metrics_with_rate(
    returns: &[f64],
    baseline: &[f64],
    rf: f64,
) -> MetricResult<ReturnMetrics> {
    let beta_value = beta(&covariance(returns, baseline)?);
    let alpha_value = match beta_value {
        Some(b) => Some(alpha(returns, b, rf, baseline)?),
        None => None,
    };

    Ok(ReturnMetrics {
        beta: beta_value,
        alpha: alpha_value,
        sharpe: sharpe_ratio(returns, rf)?,
    })
}
