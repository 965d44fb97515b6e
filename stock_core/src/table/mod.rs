pub mod ohlcv_bar;
pub mod time_series_table;
