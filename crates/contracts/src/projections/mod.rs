pub mod p900_daily_metrics;
pub mod p901_period_metrics;
