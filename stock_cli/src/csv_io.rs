use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use stock_core::common::time::{parse_date, to_date_str};
use stock_core::{OhlcvBar, TimeSeriesTable};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "AdjClose", alias = "Adj Close")]
    adj_close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
}

/// Read bars sorted by date, checking each bar's price bounds
pub fn read_bars(path: &Path, strict: bool) -> Result<Vec<OhlcvBar>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut bars = Vec::new();

    for (line, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record =
            result.with_context(|| format!("{}: bad record {}", path.display(), line + 1))?;
        let date = parse_date(&record.date)?;
        let mut bar = OhlcvBar::new(
            date,
            record.open,
            record.high,
            record.low,
            record.close,
            record.adj_close,
            record.volume,
        );
        bar.check(!strict)?;
        bars.push(bar);
    }

    if bars.is_empty() {
        bail!("{} contains no rows", path.display());
    }
    if bars.windows(2).any(|w| w[0].date > w[1].date) {
        warn!(path = %path.display(), "rows not in date order, sorting");
        bars.sort_by_key(|b| b.date);
    }
    debug!(path = %path.display(), rows = bars.len(), "loaded bars");
    Ok(bars)
}

pub fn read_table(path: &Path, strict: bool) -> Result<TimeSeriesTable> {
    let bars = read_bars(path, strict)?;
    TimeSeriesTable::from_bars(&bars).with_context(|| format!("failed to index {}", path.display()))
}

/// Write `Date` followed by every column; undefined values are left empty
pub fn write_table(path: &Path, table: &TimeSeriesTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let mut header = vec!["Date".to_string()];
    header.extend(table.column_names().iter().map(|n| n.to_string()));
    wtr.write_record(&header)?;

    for (row, date) in table.index().iter().enumerate() {
        let mut record = vec![to_date_str(*date)];
        for column in table.columns() {
            let v = column.values[row];
            record.push(if v.is_nan() { String::new() } else { v.to_string() });
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
