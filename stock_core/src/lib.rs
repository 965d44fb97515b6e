pub mod analyzer;
pub mod common;
pub mod config;
pub mod math;
pub mod metric;
pub mod table;

pub use analyzer::stock_analyzer::StockAnalyzer;
pub use common::metric_error::{ErrCode, MetricError, MetricResult};
pub use config::metric_config::MetricConfig;
pub use math::risk::{Ratio, ReturnMetrics};
pub use metric::column_manager::{apply_default_metric_set, ColumnManager};
pub use metric::metric_spec::{MetricKind, MetricSpec, Source};
pub use table::ohlcv_bar::OhlcvBar;
pub use table::time_series_table::TimeSeriesTable;
