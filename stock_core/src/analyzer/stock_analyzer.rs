use chrono::NaiveDate;
use tracing::{debug, info};

use crate::common::metric_error::{ErrCode, MetricError, MetricResult};
use crate::config::metric_config::MetricConfig;
use crate::math::risk::{return_metrics_with_rate, risk_free_rate, ReturnMetrics};
use crate::metric::column_manager::ColumnManager;
use crate::metric::metric_spec::MetricSpec;
use crate::table::ohlcv_bar::OhlcvBar;
use crate::table::time_series_table::{TimeSeriesTable, ADJ_CLOSE};

/// Single stock workflow on top of the column manager: pre-processing,
/// appending new rows, and return metrics against a baseline.
#[derive(Debug, Clone, Default)]
pub struct StockAnalyzer {
    manager: ColumnManager,
}

impl StockAnalyzer {
    pub fn new(config: MetricConfig) -> Self {
        Self {
            manager: ColumnManager::new(config),
        }
    }

    pub fn manager(&self) -> &ColumnManager {
        &self.manager
    }

    pub fn config(&self) -> &MetricConfig {
        self.manager.config()
    }

    /// Cumulative returns (when `AdjClose` is present) plus the configured
    /// metric set
    pub fn pre_process(&self, table: &mut TimeSeriesTable) -> MetricResult<()> {
        if table.has_column(ADJ_CLOSE) && !table.is_empty() {
            self.manager
                .ensure_column(table, &MetricSpec::returns(ADJ_CLOSE))?;
        }
        self.manager.apply_metric_set(table)?;
        info!(
            rows = table.len(),
            columns = table.columns().len(),
            "pre-processed table"
        );
        Ok(())
    }

    /// Append newer rows and bring every derived column up to date
    pub fn update(&self, table: &mut TimeSeriesTable, bars: &[OhlcvBar]) -> MetricResult<usize> {
        let added = table.append_bars(bars)?;
        let refreshed = self.manager.refresh(table)?;
        debug!(added, refreshed, "updated table");
        Ok(added)
    }

    /// Beta, alpha and Sharpe of `stock` against `baseline`.
    ///
    /// The two tables must share the same index. Without a risk-free table
    /// the configured `risk_free_rate` is used.
    pub fn return_metrics(
        &self,
        stock: &mut TimeSeriesTable,
        baseline: &mut TimeSeriesTable,
        risk_free: Option<&mut TimeSeriesTable>,
    ) -> MetricResult<ReturnMetrics> {
        if stock.index() != baseline.index() {
            return Err(MetricError::new(
                format!(
                    "stock ({} rows) and baseline ({} rows) are not aligned",
                    stock.len(),
                    baseline.len()
                ),
                ErrCode::LengthMismatch,
            ));
        }

        let returns = MetricSpec::returns(ADJ_CLOSE);
        let rf = match risk_free {
            Some(table) => {
                self.manager.ensure_column(table, &returns)?;
                risk_free_rate(table.column(&returns.name())?)?
            }
            None => self.config().risk_free_rate,
        };

        self.manager.ensure_column(stock, &returns)?;
        self.manager.ensure_column(baseline, &returns)?;

        let metrics = return_metrics_with_rate(
            stock.column(&returns.name())?,
            baseline.column(&returns.name())?,
            rf,
        )?;
        info!(?metrics, rf, "return metrics");
        Ok(metrics)
    }

    /// Return metrics over the period starting at `start`, with returns
    /// rebased to 1.0 on the first row of the period
    pub fn return_metrics_since(
        &self,
        start: NaiveDate,
        stock: &TimeSeriesTable,
        baseline: &TimeSeriesTable,
        risk_free: Option<&TimeSeriesTable>,
    ) -> MetricResult<ReturnMetrics> {
        let mut stock = stock.slice_from(start)?;
        let mut baseline = baseline.slice_from(start)?;
        let mut risk_free = risk_free.map(|t| t.slice_from(start)).transpose()?;
        self.return_metrics(&mut stock, &mut baseline, risk_free.as_mut())
    }
}
