pub mod config_check;
pub mod metric_config;
