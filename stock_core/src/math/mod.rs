pub mod boll;
pub mod ema;
pub mod ma;
pub mod macd;
pub mod returns;
pub mod risk;
pub mod rsi;
pub mod std_dev;
