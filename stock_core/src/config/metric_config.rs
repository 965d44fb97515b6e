use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::metric_error::{ErrCode, MetricError, MetricResult};
use crate::config::config_check::ConfigWithCheck;
use crate::math::boll::DEFAULT_BOLL_K;
use crate::metric::metric_spec::MetricSpec;
use crate::table::time_series_table::{ADJ_CLOSE, CLOSE};

/// Which metrics a table gets and with which windows.
///
/// The default is the standard set on `Close`: MA 20/30/50, EMA 12/26,
/// MACD 12/26, Bollinger 20, rolling std of the 20 day MA, RSI 14.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricConfig {
    pub price_column: String,
    pub ma_windows: Vec<usize>,
    pub ema_windows: Vec<usize>,
    /// (fast, slow) pairs
    pub macd: Vec<(usize, usize)>,
    /// Bollinger windows
    pub boll_n: Vec<usize>,
    pub boll_k: f64,
    /// Windows `w` for the rolling std (window `w`) of the `w` day MA
    pub boll_std_of_ma: Vec<usize>,
    pub rsi_cycle: Vec<usize>,
    pub ema_adjust: bool,
    /// Add `Returns` from `AdjClose` and its moving averages
    pub returns: bool,
    pub returns_ma_windows: Vec<usize>,
    /// Used when no risk-free series is supplied
    pub risk_free_rate: f64,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            price_column: CLOSE.to_string(),
            ma_windows: vec![20, 30, 50],
            ema_windows: vec![12, 26],
            macd: vec![(12, 26)],
            boll_n: vec![20],
            boll_k: DEFAULT_BOLL_K,
            boll_std_of_ma: vec![20],
            rsi_cycle: vec![14],
            ema_adjust: true,
            returns: false,
            returns_ma_windows: vec![30, 50],
            risk_free_rate: 0.01,
        }
    }
}

/// A window list, or a single window as the older scalar keys take it
#[derive(Deserialize)]
#[serde(untagged)]
enum Windows {
    One(usize),
    Many(Vec<usize>),
}

impl From<Windows> for Vec<usize> {
    fn from(windows: Windows) -> Self {
        match windows {
            Windows::One(w) => vec![w],
            Windows::Many(ws) => ws,
        }
    }
}

fn get_windows(
    conf: &mut ConfigWithCheck,
    key: &str,
    default: Vec<usize>,
) -> MetricResult<Vec<usize>> {
    Ok(conf.get::<Windows>(key)?.map(Into::into).unwrap_or(default))
}

impl MetricConfig {
    /// Build from loose key/value pairs; unknown keys are rejected
    pub fn new(conf: Option<HashMap<String, serde_json::Value>>) -> MetricResult<Self> {
        let mut conf = ConfigWithCheck::new(conf.unwrap_or_default());
        let default = Self::default();

        let config = Self {
            price_column: conf.get("price_column")?.unwrap_or(default.price_column),
            ma_windows: conf.get("ma_windows")?.unwrap_or(default.ma_windows),
            ema_windows: conf.get("ema_windows")?.unwrap_or(default.ema_windows),
            macd: conf.get("macd")?.unwrap_or(default.macd),
            boll_n: get_windows(&mut conf, "boll_n", default.boll_n)?,
            boll_k: conf.get("boll_k")?.unwrap_or(default.boll_k),
            boll_std_of_ma: get_windows(&mut conf, "boll_std_of_ma", default.boll_std_of_ma)?,
            rsi_cycle: get_windows(&mut conf, "rsi_cycle", default.rsi_cycle)?,
            ema_adjust: conf.get("ema_adjust")?.unwrap_or(default.ema_adjust),
            returns: conf.get("returns")?.unwrap_or(default.returns),
            returns_ma_windows: conf
                .get("returns_ma_windows")?
                .unwrap_or(default.returns_ma_windows),
            risk_free_rate: conf.get("risk_free_rate")?.unwrap_or(default.risk_free_rate),
        };

        conf.check()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> MetricResult<Self> {
        let conf: HashMap<String, serde_json::Value> = serde_json::from_str(json).map_err(|e| {
            MetricError::new(format!("invalid config json: {e}"), ErrCode::ConfigError)
        })?;
        Self::new(Some(conf))
    }

    pub fn from_json_file(path: &Path) -> MetricResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            MetricError::new(
                format!("cannot read config {}: {e}", path.display()),
                ErrCode::ConfigError,
            )
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> MetricResult<()> {
        let windows = self
            .ma_windows
            .iter()
            .chain(&self.ema_windows)
            .chain(&self.boll_n)
            .chain(&self.boll_std_of_ma)
            .chain(&self.rsi_cycle)
            .chain(&self.returns_ma_windows)
            .chain(self.macd.iter().flat_map(|(f, s)| [f, s]));
        for &w in windows {
            if w == 0 {
                return Err(MetricError::new("windows must be positive", ErrCode::ConfigError));
            }
        }
        if !self.boll_k.is_finite() {
            return Err(MetricError::new(
                format!("boll_k={} must be finite", self.boll_k),
                ErrCode::ConfigError,
            ));
        }
        if self.price_column.is_empty() {
            return Err(MetricError::new("price_column is empty", ErrCode::ConfigError));
        }
        Ok(())
    }

    /// Specs in dependency order. The returns block is only included when
    /// `has_adj_close` is set.
    pub fn metric_specs(&self, has_adj_close: bool) -> Vec<MetricSpec> {
        let price = self.price_column.as_str();
        let mut res: Vec<MetricSpec> = Vec::new();

        for &w in &self.ma_windows {
            res.push(MetricSpec::ma(price, w));
        }
        for &w in &self.ema_windows {
            res.push(MetricSpec::ema(price, w));
        }
        for &(fast, slow) in &self.macd {
            res.push(MetricSpec::macd(price, fast, slow));
        }
        for &w in &self.boll_n {
            res.push(MetricSpec::bollinger(price, w, self.boll_k));
        }
        for &w in &self.boll_std_of_ma {
            res.push(MetricSpec::std_dev(MetricSpec::ma(price, w), w));
        }
        for &w in &self.rsi_cycle {
            res.push(MetricSpec::rsi(price, w));
        }

        if self.returns && has_adj_close {
            let returns = MetricSpec::returns(ADJ_CLOSE);
            res.push(returns.clone());
            for &w in &self.returns_ma_windows {
                res.push(MetricSpec::ma(returns.clone(), w));
            }
        }

        res
    }
}
