pub mod config;
pub mod kline;
pub mod query;
