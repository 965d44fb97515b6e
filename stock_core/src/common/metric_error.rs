use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Error codes for the metrics engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum ErrCode {
    // Metric errors (0-99)
    #[strum(serialize = "_METRIC_ERR_BEGIN")]
    MetricErrBegin = 0,
    #[strum(serialize = "COMMON_ERROR")]
    CommonError = 1,
    #[strum(serialize = "DOMAIN_ERROR")]
    DomainError = 2,
    #[strum(serialize = "LENGTH_MISMATCH")]
    LengthMismatch = 3,
    #[strum(serialize = "INVALID_WINDOW")]
    InvalidWindow = 4,
    #[strum(serialize = "UNKNOWN_METRIC")]
    UnknownMetric = 5,
    #[strum(serialize = "CYCLIC_DEPENDENCY")]
    CyclicDependency = 6,
    #[strum(serialize = "MISSING_COLUMN")]
    MissingColumn = 7,
    #[strum(serialize = "CONFIG_ERROR")]
    ConfigError = 8,
    #[strum(serialize = "_METRIC_ERR_END")]
    MetricErrEnd = 99,

    // Table data errors (200-299)
    #[strum(serialize = "_TABLE_ERR_BEGIN")]
    TableErrBegin = 200,
    #[strum(serialize = "INDEX_NOT_MONOTONIC")]
    IndexNotMonotonic = 201,
    #[strum(serialize = "BAR_INVALID")]
    BarInvalid = 202,
    #[strum(serialize = "DATE_FORMAT_ERROR")]
    DateFormatError = 203,
    #[strum(serialize = "NO_DATA")]
    NoData = 204,
    #[strum(serialize = "_TABLE_ERR_END")]
    TableErrEnd = 299,
}

impl ErrCode {
    pub fn is_table_err(&self) -> bool {
        let code = *self as i32;
        code > Self::TableErrBegin as i32 && code < Self::TableErrEnd as i32
    }

    pub fn is_metric_err(&self) -> bool {
        let code = *self as i32;
        code > Self::MetricErrBegin as i32 && code < Self::MetricErrEnd as i32
    }
}

#[derive(Debug, Error)]
#[error("{errcode}: {msg}")]
pub struct MetricError {
    pub errcode: ErrCode,
    pub msg: String,
}

impl MetricError {
    pub fn new(message: impl Into<String>, code: ErrCode) -> Self {
        Self {
            errcode: code,
            msg: message.into(),
        }
    }

    pub fn length_mismatch(what: &str, left: usize, right: usize) -> Self {
        Self::new(
            format!("{what}: length {left} does not match length {right}"),
            ErrCode::LengthMismatch,
        )
    }

    pub fn missing_column(name: &str) -> Self {
        Self::new(format!("column {name} not found"), ErrCode::MissingColumn)
    }

    pub fn is_table_err(&self) -> bool {
        self.errcode.is_table_err()
    }

    pub fn is_metric_err(&self) -> bool {
        self.errcode.is_metric_err()
    }
}

pub type MetricResult<T> = Result<T, MetricError>;
