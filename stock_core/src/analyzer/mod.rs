pub mod stock_analyzer;
