use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Numeric body shared by the daily and period metric records and by the
/// range-analytics overview.
///
/// Additive fields are filled during accumulation and are safe to sum
/// across records; derived fields are computed exactly once from the final
/// sums, never incrementally averaged. Money/ratio fields are rounded to
/// 2 decimals at finalize; count fields stay integral.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricTotals {
    // Volumes
    pub orders_count: i64,
    pub units_sold: i64,
    pub total_customers: i64,
    pub new_customers: i64,
    pub returning_customers: i64,
    pub sessions: i64,

    // Revenue
    pub revenue: f64,
    pub gross_sales: f64,
    pub discounts: f64,
    pub refunds: f64,

    // Cost buckets
    pub cogs: f64,
    pub shipping_costs: f64,
    pub handling_fees: f64,
    pub transaction_fees: f64,
    pub marketing_costs: f64,
    pub operational_costs: f64,
    pub taxes_paid: f64,

    // Ad metrics
    pub ad_spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: f64,
    pub ad_conversion_value: f64,
    pub reach: i64,
    pub video_views: i64,
    pub video_watch_time: f64,
    /// Spend per ad platform, keyed by platform name (additive)
    #[serde(default)]
    pub platform_ad_spend: HashMap<String, f64>,
    /// Attributed conversion value per ad platform (additive)
    #[serde(default)]
    pub platform_conversion_value: HashMap<String, f64>,

    // Derived (computed once from the sums above)
    pub custom_costs: f64,
    pub total_costs: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
    pub gross_profit_margin: f64,
    pub net_profit_margin: f64,
    pub contribution_margin: f64,
    pub contribution_margin_percentage: f64,
    pub discount_rate: f64,
    pub avg_order_value: f64,
    pub avg_order_cost: f64,
    pub avg_order_profit: f64,
    pub ad_spend_per_order: f64,
    pub repeat_customer_rate: f64,
    pub customer_acquisition_cost: f64,
    pub blended_roas: f64,
    /// ROAS per ad platform, keyed by platform name
    #[serde(default)]
    pub platform_roas: HashMap<String, f64>,
}

/// One metrics record per (organization, date). Engine-owned: created on the
/// first contribution for a date, patched on every recomputation run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetric {
    pub organization_id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: MetricTotals,
}

impl DailyMetric {
    pub fn new(organization_id: &str, date: NaiveDate) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            date,
            totals: MetricTotals::default(),
        }
    }
}
