use chrono::{Duration, NaiveDate};
use stock_core::math::{
    boll::bollinger,
    ema::ema,
    ma::sma,
    macd::macd,
    returns::cumulative_returns,
    risk::{beta, covariance, sharpe_ratio},
    rsi::rsi,
    std_dev::rolling_std,
};
use stock_core::{apply_default_metric_set, ColumnManager, MetricSpec, OhlcvBar, TimeSeriesTable};

const CLOSE: [f64; 10] = [100.0, 102.0, 101.0, 105.0, 107.0, 106.0, 110.0, 108.0, 111.0, 115.0];

fn sample_table(closes: &[f64]) -> TimeSeriesTable {
    let start = NaiveDate::from_ymd_opt(2020, 7, 29).unwrap();
    let bars: Vec<OhlcvBar> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            OhlcvBar::new(
                start + Duration::days(i as i64),
                c - 0.5,
                c + 1.0,
                c - 1.0,
                c,
                c * 0.98,
                10_000.0 + i as f64,
            )
        })
        .collect();
    TimeSeriesTable::from_bars(&bars).unwrap()
}

fn wavy(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 * 0.37).sin() * 4.0 + i as f64 * 0.05)
        .collect()
}

#[test]
fn sma_window_three_on_sample_close() {
    let ma = sma(&CLOSE, 3).unwrap();
    assert!(ma[0].is_nan());
    assert!(ma[1].is_nan());
    assert_eq!(ma[2], 101.0);
    assert!((ma[9] - (108.0 + 111.0 + 115.0) / 3.0).abs() < 1e-12);
}

#[test]
fn sma_defined_exactly_from_window_end() {
    let series = wavy(40);
    for w in [1, 5, 20, 40] {
        let ma = sma(&series, w).unwrap();
        for (i, v) in ma.iter().enumerate() {
            if i + 1 < w {
                assert!(v.is_nan());
            } else {
                let mean = series[i + 1 - w..=i].iter().sum::<f64>() / w as f64;
                assert!((v - mean).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn ema_defined_from_first_index() {
    let series = wavy(30);
    let out = ema(&series, 12, true).unwrap();
    assert_eq!(out[0], series[0]);
    assert!(out.iter().all(|v| v.is_finite()));
}

#[test]
fn macd_equals_ema_difference() {
    let series = wavy(60);
    let out = macd(&series, 12, 26, true).unwrap();
    let fast = ema(&series, 12, true).unwrap();
    let slow = ema(&series, 26, true).unwrap();
    for i in 0..series.len() {
        assert!((out[i] - (fast[i] - slow[i])).abs() < 1e-12);
    }
}

#[test]
fn bollinger_width_is_four_std() {
    let series = wavy(50);
    let bands = bollinger(&series, 20, 2.0).unwrap();
    let sd = rolling_std(&series, 20).unwrap();
    for i in 19..series.len() {
        assert!((bands.upper[i] - bands.lower[i] - 4.0 * sd[i]).abs() < 1e-9);
    }
}

#[test]
fn rsi_bounded_and_saturates() {
    let series = wavy(80);
    for v in rsi(&series, 14).unwrap().iter().filter(|v| !v.is_nan()) {
        assert!((0.0..=100.0).contains(v));
    }

    let rising: Vec<f64> = (0..30).map(|i| 1.0 + i as f64).collect();
    assert!(rsi(&rising, 14).unwrap()[14..].iter().all(|&v| v == 100.0));
}

#[test]
fn cumulative_returns_boundaries() {
    assert_eq!(cumulative_returns(&wavy(10)).unwrap()[0], 1.0);
    assert!(cumulative_returns(&[3.0; 12]).unwrap().iter().all(|&r| r == 1.0));
    assert!(cumulative_returns(&[]).is_err());
}

#[test]
fn undefined_ratios() {
    for cross in [0.0, 0.3, -2.0] {
        assert!(beta(&[[1.0, cross], [cross, 0.0]]).is_none());
    }
    for rf in [0.0, 0.01, 0.2] {
        assert!(sharpe_ratio(&[1.0; 6], rf).unwrap().is_none());
    }
    assert!(covariance(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
}

#[test]
fn ensure_column_twice_is_idempotent() {
    let mut table = sample_table(&CLOSE);
    let manager = ColumnManager::default();
    let spec = MetricSpec::bollinger("Close", 3, 2.0);

    manager.ensure_column(&mut table, &spec).unwrap();
    let snapshot = table.clone();
    manager.ensure_column(&mut table, &spec).unwrap();

    for name in spec.output_names() {
        let occurrences = table.column_names().iter().filter(|n| **n == name).count();
        assert_eq!(occurrences, 1);
    }
    assert_eq!(table.column_names(), snapshot.column_names());
    for name in snapshot.column_names() {
        let a = table.column(name).unwrap();
        let b = snapshot.column(name).unwrap();
        assert!(a.iter().zip(b).all(|(x, y)| (x.is_nan() && y.is_nan()) || x == y));
    }
}

#[test]
fn default_metric_set_then_append_matches_full_build() {
    let closes = wavy(70);
    let mut full = sample_table(&closes);
    apply_default_metric_set(&mut full).unwrap();

    let mut partial = sample_table(&closes[..55]);
    apply_default_metric_set(&mut partial).unwrap();
    let whole = sample_table(&closes);
    let bars: Vec<OhlcvBar> = (55..70)
        .map(|i| {
            let c = closes[i];
            let volume = 10_000.0 + i as f64;
            OhlcvBar::new(whole.index()[i], c - 0.5, c + 1.0, c - 1.0, c, c * 0.98, volume)
        })
        .collect();
    partial.append_bars(&bars).unwrap();
    ColumnManager::default().refresh(&mut partial).unwrap();

    assert_eq!(partial.index(), full.index());
    for name in full.column_names() {
        let a = partial.column(name).unwrap();
        let b = full.column(name).unwrap();
        for (x, y) in a.iter().zip(b) {
            assert!((x.is_nan() && y.is_nan()) || (x - y).abs() < 1e-9, "{name}");
        }
    }
}
