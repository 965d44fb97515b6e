use crate::common::func_util::check_same_len;
use crate::common::metric_error::MetricResult;
use crate::math::{ma::sma, std_dev::rolling_std};

pub const DEFAULT_BOLL_K: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollBands {
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bands from an already computed moving average and rolling std
pub fn bands_from(mid: &[f64], std_dev: &[f64], k: f64) -> MetricResult<BollBands> {
    check_same_len("bollinger", mid, std_dev)?;
    let (upper, lower) = mid
        .iter()
        .zip(std_dev)
        .map(|(&m, &sd)| (m + k * sd, m - k * sd))
        .unzip();
    Ok(BollBands { upper, lower })
}

/// Bollinger bands: `SMA ± k * RollingStd` over `window`
pub fn bollinger(series: &[f64], window: usize, k: f64) -> MetricResult<BollBands> {
    let mid = sma(series, window)?;
    let std_dev = rolling_std(series, window)?;
    bands_from(&mid, &std_dev, k)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSE: [f64; 10] = [100.0, 102.0, 101.0, 105.0, 107.0, 106.0, 110.0, 108.0, 111.0, 115.0];

    #[test]
    fn test_band_width_is_four_std() {
        let bands = bollinger(&CLOSE, 4, DEFAULT_BOLL_K).unwrap();
        let sd = rolling_std(&CLOSE, 4).unwrap();
        for i in 0..CLOSE.len() {
            if sd[i].is_nan() {
                assert!(bands.upper[i].is_nan() && bands.lower[i].is_nan());
                continue;
            }
            assert!((bands.upper[i] - bands.lower[i] - 4.0 * sd[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bands_symmetric_around_mean() {
        let bands = bollinger(&CLOSE, 3, 2.0).unwrap();
        let mid = sma(&CLOSE, 3).unwrap();
        for i in 2..CLOSE.len() {
            let centre = (bands.upper[i] + bands.lower[i]) / 2.0;
            assert!((centre - mid[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_flat_series_collapses_bands() {
        let bands = bollinger(&[50.0; 5], 3, 2.0).unwrap();
        assert_eq!(bands.upper[4], 50.0);
        assert_eq!(bands.lower[4], 50.0);
    }
}
