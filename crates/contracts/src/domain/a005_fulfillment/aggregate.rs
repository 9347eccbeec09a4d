use serde::{Deserialize, Serialize};

/// Fulfillment recorded against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fulfillment {
    pub id: String,
    pub order_id: String,
    /// e.g. success, cancelled, error
    pub status: String,
    /// Epoch milliseconds UTC
    #[serde(default)]
    pub shipped_at: Option<i64>,
    #[serde(default)]
    pub tracking_company: Option<String>,
}
