use chrono::NaiveDate;

use crate::common::metric_error::{ErrCode, MetricError, MetricResult};

/// One daily observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        adj_close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            adj_close,
            volume,
        }
    }

    /// Low must be the minimum and high the maximum of the four prices.
    /// With `autofix` the offending bound is widened instead of failing.
    pub fn check(&mut self, autofix: bool) -> MetricResult<()> {
        let min_price = self.low.min(self.open).min(self.high).min(self.close);
        let max_price = self.low.max(self.open).max(self.high).max(self.close);

        if self.low > min_price {
            if autofix {
                self.low = min_price;
            } else {
                return Err(MetricError::new(
                    format!(
                        "{} low price={} is not min of [low={}, open={}, high={}, close={}]",
                        self.date, self.low, self.low, self.open, self.high, self.close
                    ),
                    ErrCode::BarInvalid,
                ));
            }
        }

        if self.high < max_price {
            if autofix {
                self.high = max_price;
            } else {
                return Err(MetricError::new(
                    format!(
                        "{} high price={} is not max of [low={}, open={}, high={}, close={}]",
                        self.date, self.high, self.low, self.open, self.high, self.close
                    ),
                    ErrCode::BarInvalid,
                ));
            }
        }
        Ok(())
    }
}
