use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Storefront customer, carried along the primary order track.
///
/// `first_order_at` is the customer's first purchase in store history (not
/// just within the loaded range); it drives the new/returning split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub organization_id: String,
    /// Epoch milliseconds UTC
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Epoch milliseconds UTC of the first purchase, if known
    #[serde(default)]
    pub first_order_at: Option<i64>,
    /// Lifetime order count as of the sync
    #[serde(default)]
    pub orders_count: i64,
}

impl Customer {
    /// UTC date of the first purchase, if known.
    pub fn first_order_date(&self) -> Option<NaiveDate> {
        self.first_order_at
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive())
    }
}
