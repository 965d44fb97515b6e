use tracing::{debug, trace};

use crate::common::metric_error::{ErrCode, MetricError, MetricResult};
use crate::config::metric_config::MetricConfig;
use crate::math::{
    boll::bands_from,
    ema::ema,
    ma::sma,
    macd::ema_difference,
    returns::cumulative_returns,
    rsi::rsi,
    std_dev::rolling_std,
};
use crate::metric::metric_spec::{MetricKind, MetricSpec};
use crate::table::time_series_table::{TimeSeriesTable, ADJ_CLOSE};

/// Keeps derived columns of a table in sync with the metrics requested.
///
/// Every derived column goes through [`ensure_column`](Self::ensure_column):
/// prerequisites are resolved depth first and only computed when missing or
/// stale, and the target is upserted so repeated calls never duplicate it.
#[derive(Debug, Clone, Default)]
pub struct ColumnManager {
    config: MetricConfig,
}

impl ColumnManager {
    pub fn new(config: MetricConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    /// Make sure every column of `spec` is on the table with current values
    pub fn ensure_column(
        &self,
        table: &mut TimeSeriesTable,
        spec: &MetricSpec,
    ) -> MetricResult<()> {
        let mut visiting = Vec::new();
        self.ensure_inner(table, spec, &mut visiting)
    }

    /// Parse a derived column name and ensure it
    pub fn ensure_named(
        &self,
        table: &mut TimeSeriesTable,
        name: &str,
    ) -> MetricResult<MetricSpec> {
        let spec = MetricSpec::parse(name)?;
        self.ensure_column(table, &spec)?;
        Ok(spec)
    }

    fn ensure_inner(
        &self,
        table: &mut TimeSeriesTable,
        spec: &MetricSpec,
        visiting: &mut Vec<String>,
    ) -> MetricResult<()> {
        let name = spec.name();
        if visiting.contains(&name) {
            return Err(MetricError::new(
                format!("cyclic dependency: {} -> {name}", visiting.join(" -> ")),
                ErrCode::CyclicDependency,
            ));
        }
        visiting.push(name);

        for dep in spec.dependencies() {
            if is_current(table, &dep) {
                trace!(column = %dep, "prerequisite present");
                continue;
            }
            self.ensure_inner(table, &dep, visiting)?;
        }

        let outputs = self.compute(table, spec)?;
        for (column, values) in spec.output_names().iter().zip(outputs) {
            debug!(column = %column, kind = %spec.kind, "set derived column");
            table.set_derived_column(column, values, spec)?;
        }

        visiting.pop();
        Ok(())
    }

    /// Values for each of `spec.output_names()`, read from the table.
    /// Prerequisite columns must already be there.
    fn compute(&self, table: &TimeSeriesTable, spec: &MetricSpec) -> MetricResult<Vec<Vec<f64>>> {
        let source = spec.source.name();
        let input = || table.column(&source);

        let values = match spec.kind {
            MetricKind::Returns => cumulative_returns(input()?)?,
            MetricKind::MovingAverage { window } => sma(input()?, window)?,
            MetricKind::ExpMovingAverage { span } => ema(input()?, span, self.config.ema_adjust)?,
            MetricKind::StdDev { window } => rolling_std(input()?, window)?,
            MetricKind::Rsi { window } => rsi(input()?, window)?,
            MetricKind::Macd { fast, slow } => {
                let fast_ema = table.column(&MetricSpec::ema(spec.source.clone(), fast).name())?;
                let slow_ema = table.column(&MetricSpec::ema(spec.source.clone(), slow).name())?;
                ema_difference(fast_ema, slow_ema)?
            }
            MetricKind::Bollinger { window, k } => {
                let mid = table.column(&MetricSpec::ma(spec.source.clone(), window).name())?;
                let sd = table.column(&MetricSpec::std_dev(spec.source.clone(), window).name())?;
                let bands = bands_from(mid, sd, k)?;
                return Ok(vec![bands.upper, bands.lower]);
            }
        };
        Ok(vec![values])
    }

    /// Apply every metric named by the configuration, in dependency order
    pub fn apply_metric_set(&self, table: &mut TimeSeriesTable) -> MetricResult<()> {
        let specs = self.config.metric_specs(table.has_column(ADJ_CLOSE));
        debug!(count = specs.len(), rows = table.len(), "apply metric set");
        for spec in &specs {
            self.ensure_column(table, spec)?;
        }
        Ok(())
    }

    /// Recompute derived columns left stale by appended rows. Creation order
    /// is a dependency order, so each column sees fresh inputs.
    pub fn refresh(&self, table: &mut TimeSeriesTable) -> MetricResult<usize> {
        let stale: Vec<MetricSpec> = table
            .derived_specs()
            .into_iter()
            .filter(|spec| !is_current(table, spec))
            .cloned()
            .collect();

        for spec in &stale {
            if !is_current(table, spec) {
                self.ensure_column(table, spec)?;
            }
        }
        debug!(count = stale.len(), "refreshed stale columns");
        Ok(stale.len())
    }
}

/// All outputs present and not stale
fn is_current(table: &TimeSeriesTable, spec: &MetricSpec) -> bool {
    spec.output_names()
        .iter()
        .all(|name| table.has_column(name) && !table.is_stale(name))
}

/// Apply the standard metric set to the `Close` column
pub fn apply_default_metric_set(table: &mut TimeSeriesTable) -> MetricResult<()> {
    ColumnManager::default().apply_metric_set(table)
}
