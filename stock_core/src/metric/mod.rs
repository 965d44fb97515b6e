pub mod column_manager;
pub mod metric_spec;
