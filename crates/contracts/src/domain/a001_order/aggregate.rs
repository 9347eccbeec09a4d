use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Synced storefront order.
///
/// Read-only to the analytics engine: the sync pipeline owns these records.
/// Immutable once synced except the status fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Platform order id
    pub id: String,

    /// Owning organization (a.k.a. merchant/tenant)
    pub organization_id: String,

    /// Order creation time, epoch milliseconds UTC
    pub created_at: i64,

    /// Charged total (after discounts, incl. shipping and tax)
    pub total_price: f64,

    /// Line-item total after discounts, before shipping/tax
    pub subtotal_price: f64,

    pub total_discounts: f64,
    pub total_shipping_price: f64,
    pub total_tax: f64,

    /// Units across all line items
    pub total_quantity: i64,

    #[serde(default)]
    pub customer_id: Option<String>,

    /// e.g. paid / pending / refunded
    #[serde(default)]
    pub financial_status: Option<String>,

    /// e.g. fulfilled / partial / unfulfilled
    #[serde(default)]
    pub fulfillment_status: Option<String>,
}

impl Order {
    /// UTC calendar date the order was created on. None for timestamps
    /// outside the representable range.
    pub fn created_date(&self) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp_millis(self.created_at).map(|dt| dt.date_naive())
    }

    /// Gross sales before discounts (subtotal is post-discount)
    pub fn gross_sales(&self) -> f64 {
        self.subtotal_price + self.total_discounts
    }
}

/// One line of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub id: String,
    pub order_id: String,
    pub variant_id: String,
    pub quantity: i64,
    pub unit_price: f64,
    /// Discount applied to the whole line
    #[serde(default)]
    pub line_discount: f64,
}

impl OrderLineItem {
    /// Net line revenue: unit price × quantity − line discount, floored at 0.
    pub fn net_revenue(&self) -> f64 {
        (self.unit_price * self.quantity as f64 - self.line_discount).max(0.0)
    }
}
