use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::common::metric_error::{ErrCode, MetricError, MetricResult};

/// Key/value configuration that remembers which keys were consumed, so
/// leftovers can be reported as unknown parameters.
#[derive(Debug, Default)]
pub struct ConfigWithCheck {
    conf: HashMap<String, Value>,
}

impl ConfigWithCheck {
    pub fn new(conf: HashMap<String, Value>) -> Self {
        Self { conf }
    }

    /// Take `key` out of the config, decoding it as `T`
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> MetricResult<Option<T>> {
        match self.conf.remove(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                MetricError::new(format!("invalid value for {key}: {e}"), ErrCode::ConfigError)
            }),
        }
    }

    pub fn check(self) -> MetricResult<()> {
        if self.conf.is_empty() {
            return Ok(());
        }
        let mut unknown: Vec<String> = self.conf.into_keys().collect();
        unknown.sort();
        Err(MetricError::new(
            format!("unknown para = {}", unknown.join(", ")),
            ErrCode::ConfigError,
        ))
    }
}
