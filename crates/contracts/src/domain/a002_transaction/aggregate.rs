use serde::{Deserialize, Serialize};

/// Payment transaction recorded against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTransaction {
    pub id: String,
    pub order_id: String,
    pub amount: f64,
    /// Gateway fee as reported by the provider
    #[serde(default)]
    pub fee: f64,
    /// e.g. shopify_payments, paypal, manual
    pub gateway: String,
    /// e.g. sale, capture, refund, void
    pub kind: String,
    /// Epoch milliseconds UTC
    pub processed_at: i64,
}

/// Refund issued against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub id: String,
    pub order_id: String,
    pub amount: f64,
    /// Epoch milliseconds UTC
    pub processed_at: i64,
    #[serde(default)]
    pub note: Option<String>,
}
