pub mod func_util;
pub mod metric_error;
pub mod time;
