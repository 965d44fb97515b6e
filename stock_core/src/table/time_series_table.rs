use std::ops::Index;

use chrono::NaiveDate;
use tracing::debug;

use crate::common::metric_error::{ErrCode, MetricError, MetricResult};
use crate::metric::metric_spec::MetricSpec;
use crate::table::ohlcv_bar::OhlcvBar;

pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const ADJ_CLOSE: &str = "AdjClose";
pub const VOLUME: &str = "Volume";

pub const BASE_COLUMNS: [&str; 6] = [OPEN, HIGH, LOW, CLOSE, ADJ_CLOSE, VOLUME];

/// Where the values of a column come from
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOrigin {
    Raw,
    Derived(MetricSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
    pub origin: ColumnOrigin,
    /// Derived column whose inputs changed since it was computed
    pub stale: bool,
}

/// Date indexed table of numeric columns.
///
/// The index is strictly increasing. Columns keep their insertion order and
/// are only ever added or replaced whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesTable {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

fn check_strictly_increasing(dates: &[NaiveDate]) -> MetricResult<()> {
    if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(MetricError::new(
            format!("index not strictly increasing at {} -> {}", w[0], w[1]),
            ErrCode::IndexNotMonotonic,
        ));
    }
    Ok(())
}

impl TimeSeriesTable {
    pub fn new(index: Vec<NaiveDate>) -> MetricResult<Self> {
        check_strictly_increasing(&index)?;
        Ok(Self {
            index,
            columns: Vec::new(),
        })
    }

    /// Table with the six base columns filled from `bars`
    pub fn from_bars(bars: &[OhlcvBar]) -> MetricResult<Self> {
        let mut table = Self::new(bars.iter().map(|b| b.date).collect())?;
        for name in BASE_COLUMNS {
            let values = bars.iter().map(|b| base_value(b, name)).collect();
            table.set_column(name, values)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.index.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.index.last().copied()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get_column(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.columns[i].values.as_slice())
    }

    /// Like [`get_column`](Self::get_column) but a missing column is an error
    pub fn column(&self, name: &str) -> MetricResult<&[f64]> {
        self.get_column(name)
            .ok_or_else(|| MetricError::missing_column(name))
    }

    pub fn is_stale(&self, name: &str) -> bool {
        self.position(name)
            .map(|i| self.columns[i].stale)
            .unwrap_or(false)
    }

    /// Upsert a raw column. Derived columns computed from it become stale.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) -> MetricResult<()> {
        self.upsert(name, values, ColumnOrigin::Raw)?;
        self.mark_stale_from(name);
        Ok(())
    }

    fn mark_stale_from(&mut self, name: &str) {
        for column in &mut self.columns {
            if let ColumnOrigin::Derived(spec) = &column.origin {
                if spec.root_column() == name {
                    column.stale = true;
                }
            }
        }
    }

    /// Upsert a column computed from `spec`
    pub fn set_derived_column(
        &mut self,
        name: &str,
        values: Vec<f64>,
        spec: &MetricSpec,
    ) -> MetricResult<()> {
        self.upsert(name, values, ColumnOrigin::Derived(spec.clone()))
    }

    fn upsert(&mut self, name: &str, values: Vec<f64>, origin: ColumnOrigin) -> MetricResult<()> {
        if values.len() != self.len() {
            return Err(MetricError::length_mismatch(
                &format!("column {name}"),
                values.len(),
                self.len(),
            ));
        }

        match self.position(name) {
            Some(i) => {
                let column = &mut self.columns[i];
                column.values = values;
                column.origin = origin;
                column.stale = false;
            }
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
                origin,
                stale: false,
            }),
        }
        Ok(())
    }

    /// Distinct specs of derived columns, in the order they were first added
    pub fn derived_specs(&self) -> Vec<&MetricSpec> {
        let mut specs: Vec<&MetricSpec> = Vec::new();
        for column in &self.columns {
            if let ColumnOrigin::Derived(spec) = &column.origin {
                if !specs.contains(&spec) {
                    specs.push(spec);
                }
            }
        }
        specs
    }

    /// Append rows dated strictly after the current last row.
    ///
    /// Base columns take the bar values, other raw columns are padded with
    /// NaN, and every derived column is padded and marked stale until it is
    /// recomputed.
    pub fn append_bars(&mut self, bars: &[OhlcvBar]) -> MetricResult<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let new_dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
        check_strictly_increasing(&new_dates)?;
        if let Some(last) = self.last_date() {
            if new_dates[0] <= last {
                return Err(MetricError::new(
                    format!("appended row {} is not after last row {}", new_dates[0], last),
                    ErrCode::IndexNotMonotonic,
                ));
            }
        }

        let new_len = self.len() + bars.len();
        for column in &mut self.columns {
            let base = BASE_COLUMNS.contains(&column.name.as_str());
            match column.origin {
                ColumnOrigin::Raw if base => column
                    .values
                    .extend(bars.iter().map(|b| base_value(b, &column.name))),
                ColumnOrigin::Raw => column.values.resize(new_len, f64::NAN),
                ColumnOrigin::Derived(_) => {
                    column.values.resize(new_len, f64::NAN);
                    column.stale = true;
                }
            }
        }
        self.index.extend(new_dates);

        for name in BASE_COLUMNS {
            if !self.has_column(name) {
                debug!(column = name, "append created missing base column");
                let values = self
                    .index
                    .iter()
                    .map(|d| {
                        bars.iter()
                            .find(|b| b.date == *d)
                            .map(|b| base_value(b, name))
                            .unwrap_or(f64::NAN)
                    })
                    .collect();
                self.set_column(name, values)?;
            }
        }

        Ok(bars.len())
    }

    /// Raw columns from `start` (inclusive) on. Derived columns are dropped
    /// since their windows would otherwise reach before the new first row.
    pub fn slice_from(&self, start: NaiveDate) -> MetricResult<Self> {
        let offset = self.index.partition_point(|d| *d < start);
        if offset == self.len() {
            return Err(MetricError::new(
                format!("no rows on or after {start}"),
                ErrCode::NoData,
            ));
        }

        let mut table = Self::new(self.index[offset..].to_vec())?;
        for column in &self.columns {
            if column.origin == ColumnOrigin::Raw {
                table.set_column(&column.name, column.values[offset..].to_vec())?;
            }
        }
        Ok(table)
    }
}

impl<'a> Index<&'a str> for TimeSeriesTable {
    type Output = [f64];

    fn index(&self, name: &'a str) -> &Self::Output {
        match self.get_column(name) {
            Some(values) => values,
            None => panic!("column {name} not found"),
        }
    }
}

fn base_value(bar: &OhlcvBar, name: &str) -> f64 {
    match name {
        OPEN => bar.open,
        HIGH => bar.high,
        LOW => bar.low,
        CLOSE => bar.close,
        ADJ_CLOSE => bar.adj_close,
        VOLUME => bar.volume,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::metric_spec::MetricSpec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 9, d).unwrap()
    }

    fn bars(days: &[u32]) -> Vec<OhlcvBar> {
        days.iter()
            .map(|&d| {
                let p = 100.0 + d as f64;
                OhlcvBar::new(day(d), p, p + 1.0, p - 1.0, p, p * 0.9, 1000.0 * d as f64)
            })
            .collect()
    }

    #[test]
    fn test_new_rejects_unordered_index() {
        let err = TimeSeriesTable::new(vec![day(2), day(1)]).unwrap_err();
        assert_eq!(err.errcode, ErrCode::IndexNotMonotonic);
        let err = TimeSeriesTable::new(vec![day(1), day(1)]).unwrap_err();
        assert_eq!(err.errcode, ErrCode::IndexNotMonotonic);
    }

    #[test]
    fn test_from_bars_base_columns() {
        let table = TimeSeriesTable::from_bars(&bars(&[1, 2, 3])).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), BASE_COLUMNS.to_vec());
        assert_eq!(table.column(CLOSE).unwrap(), &[101.0, 102.0, 103.0]);
        assert_eq!(&table[VOLUME], &[1000.0, 2000.0, 3000.0]);
    }

    #[test]
    fn test_set_column_upserts_in_place() {
        let mut table = TimeSeriesTable::from_bars(&bars(&[1, 2])).unwrap();
        table.set_column("Extra", vec![1.0, 2.0]).unwrap();
        table.set_column(OPEN, vec![0.0, 0.0]).unwrap();
        table.set_column("Extra", vec![3.0, 4.0]).unwrap();

        let names = table.column_names();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], OPEN);
        assert_eq!(names[6], "Extra");
        assert_eq!(table.get_column("Extra").unwrap(), &[3.0, 4.0]);
        assert_eq!(table.get_column(OPEN).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_replacing_raw_column_marks_derived_stale() {
        let mut table = TimeSeriesTable::from_bars(&bars(&[1, 2])).unwrap();
        let close_ma = MetricSpec::ma(CLOSE, 1);
        let open_ma = MetricSpec::ma(OPEN, 1);
        let nested = MetricSpec::std_dev(close_ma.clone(), 2);
        table.set_derived_column(&close_ma.name(), vec![101.0, 102.0], &close_ma).unwrap();
        table.set_derived_column(&open_ma.name(), vec![101.0, 102.0], &open_ma).unwrap();
        table.set_derived_column(&nested.name(), vec![f64::NAN, 0.7], &nested).unwrap();

        table.set_column(CLOSE, vec![50.0, 60.0]).unwrap();
        assert!(table.is_stale("Close_MA_1"));
        assert!(table.is_stale("Close_MA_1_SD_2"));
        assert!(!table.is_stale("Open_MA_1"));
        assert!(!table.is_stale(CLOSE));
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut table = TimeSeriesTable::from_bars(&bars(&[1, 2])).unwrap();
        let err = table.set_column("Bad", vec![1.0]).unwrap_err();
        assert_eq!(err.errcode, ErrCode::LengthMismatch);
        assert!(!table.has_column("Bad"));
    }

    #[test]
    fn test_missing_column() {
        let table = TimeSeriesTable::from_bars(&bars(&[1])).unwrap();
        assert!(table.get_column("Nope").is_none());
        assert_eq!(table.column("Nope").unwrap_err().errcode, ErrCode::MissingColumn);
    }

    #[test]
    fn test_append_bars_marks_derived_stale() {
        let mut table = TimeSeriesTable::from_bars(&bars(&[1, 2])).unwrap();
        let spec = MetricSpec::ma(CLOSE, 2);
        table.set_derived_column(&spec.name(), vec![f64::NAN, 101.5], &spec).unwrap();
        table.set_column("Note", vec![1.0, 1.0]).unwrap();

        assert_eq!(table.append_bars(&bars(&[3, 4])).unwrap(), 2);
        assert_eq!(table.len(), 4);
        assert_eq!(table.column(CLOSE).unwrap(), &[101.0, 102.0, 103.0, 104.0]);
        assert!(table.is_stale("Close_MA_2"));
        assert!(!table.is_stale(CLOSE));
        assert!(table.get_column("Note").unwrap()[3].is_nan());
        assert_eq!(table.derived_specs(), vec![&spec]);
    }

    #[test]
    fn test_append_bars_rejects_overlap() {
        let mut table = TimeSeriesTable::from_bars(&bars(&[1, 2])).unwrap();
        let err = table.append_bars(&bars(&[2, 3])).unwrap_err();
        assert_eq!(err.errcode, ErrCode::IndexNotMonotonic);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_append_to_empty_table() {
        let mut table = TimeSeriesTable::new(Vec::new()).unwrap();
        table.append_bars(&bars(&[7, 8])).unwrap();
        assert_eq!(table.index(), &[day(7), day(8)]);
        assert_eq!(table.column(OPEN).unwrap(), &[107.0, 108.0]);
    }

    #[test]
    fn test_slice_from_keeps_raw_columns() {
        let mut table = TimeSeriesTable::from_bars(&bars(&[1, 2, 3, 4])).unwrap();
        let spec = MetricSpec::ma(CLOSE, 1);
        let values = table.column(CLOSE).unwrap().to_vec();
        table.set_derived_column(&spec.name(), values, &spec).unwrap();

        let sliced = table.slice_from(day(3)).unwrap();
        assert_eq!(sliced.index(), &[day(3), day(4)]);
        assert_eq!(sliced.column(CLOSE).unwrap(), &[103.0, 104.0]);
        assert!(!sliced.has_column("Close_MA_1"));

        assert_eq!(table.slice_from(day(9)).unwrap_err().errcode, ErrCode::NoData);
    }
}
