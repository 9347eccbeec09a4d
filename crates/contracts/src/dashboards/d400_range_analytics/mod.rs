use crate::projections::p900_daily_metrics::dto::MetricTotals;
use crate::shared::date_range::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsFilters {
    #[serde(default)]
    pub granularity: Granularity,
    /// Keep only orders with this financial status (e.g. "paid")
    #[serde(default)]
    pub financial_status: Option<String>,
}

/// Request for read-only range analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeAnalyticsRequest {
    pub organization_id: String,
    pub date_range: DateRange,
    #[serde(default)]
    pub filters: AnalyticsFilters,
}

/// Cost/profit breakdown for a single order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProfitRow {
    pub order_id: String,
    pub date: NaiveDate,
    pub revenue: f64,
    pub units: i64,
    pub cogs: f64,
    pub shipping_cost: f64,
    pub handling_fee: f64,
    pub transaction_fees: f64,
    pub marketing_cost: f64,
    pub operational_cost: f64,
    pub taxes: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub profit_margin: f64,
}

/// One row of the period table at the requested granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRow {
    /// "YYYY-MM-DD" for days, "YYYY-Www" for weeks, "YYYY-MM" for months
    pub period_key: String,
    pub days_included: i64,
    #[serde(flatten)]
    pub totals: MetricTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RangeAnalyticsResponse {
    pub overview: MetricTotals,
    pub per_order_breakdown: Vec<OrderProfitRow>,
    pub period_table: Vec<PeriodRow>,
}
