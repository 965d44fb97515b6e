use chrono::{NaiveDate, NaiveDateTime};

use crate::common::metric_error::{ErrCode, MetricError, MetricResult};

/// Parse a date key. Supports "YYYY-MM-DD", "YYYY/MM/DD", "YYYYMMDD" and
/// "YYYY-MM-DD HH:MM:SS" (time of day is dropped).
pub fn parse_date(date_str: &str) -> MetricResult<NaiveDate> {
    let s = date_str.trim();
    let parsed = if s.contains(' ') {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
    } else if s.contains('-') {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
    } else if s.contains('/') {
        NaiveDate::parse_from_str(s, "%Y/%m/%d")
    } else {
        NaiveDate::parse_from_str(s, "%Y%m%d")
    };

    parsed.map_err(|e| {
        MetricError::new(
            format!("cannot parse date {date_str:?}: {e}"),
            ErrCode::DateFormatError,
        )
    })
}

pub fn to_date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
