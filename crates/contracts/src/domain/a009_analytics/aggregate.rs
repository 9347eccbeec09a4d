use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of storefront session analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnalytics {
    pub id: String,
    pub organization_id: String,
    pub date: NaiveDate,
    pub sessions: i64,
    #[serde(default)]
    pub page_views: i64,
}

/// One shop-level analytics fact (key/value time series).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopAnalytics {
    pub id: String,
    pub organization_id: String,
    pub date: NaiveDate,
    /// e.g. checkout_rate, cart_additions
    pub metric: String,
    pub value: f64,
}
