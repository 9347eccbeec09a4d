use crate::domain::a001_order::aggregate::{Order, OrderLineItem};
use crate::domain::a002_transaction::aggregate::{OrderTransaction, Refund};
use crate::domain::a003_product::aggregate::{Product, ProductVariant};
use crate::domain::a004_customer::aggregate::Customer;
use crate::domain::a005_fulfillment::aggregate::Fulfillment;
use crate::domain::a006_variant_cost::aggregate::VariantCostComponent;
use crate::domain::a007_cost_rule::aggregate::CostRule;
use crate::domain::a008_ad_insight::aggregate::AdInsight;
use crate::domain::a009_analytics::aggregate::{SessionAnalytics, ShopAnalytics};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Everything one loader run returned for an organization + date range.
///
/// Every dataset array is always present; datasets outside the request's
/// allow-list come back empty, not absent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RangeDatasets {
    pub orders: Vec<Order>,
    pub line_items: Vec<OrderLineItem>,
    pub transactions: Vec<OrderTransaction>,
    pub refunds: Vec<Refund>,
    pub fulfillments: Vec<Fulfillment>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub variants: Vec<ProductVariant>,
    pub variant_cost_components: Vec<VariantCostComponent>,
    pub ad_insights: Vec<AdInsight>,
    pub cost_rules: Vec<CostRule>,
    pub session_analytics: Vec<SessionAnalytics>,
    pub shop_analytics: Vec<ShopAnalytics>,
    pub metadata: LoadMetadata,
}

/// Observability sidecar for one loader run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadMetadata {
    pub run_id: Uuid,
    /// Pages fetched per dataset key
    pub pages_fetched: HashMap<String, u32>,
    /// Quota-driven page-size halvings per dataset key
    pub page_size_reductions: HashMap<String, u32>,
    /// Primary track was cut short by `limits.max_orders`
    pub truncated_orders: bool,
}

impl Default for LoadMetadata {
    fn default() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pages_fetched: HashMap::new(),
            page_size_reductions: HashMap::new(),
            truncated_orders: false,
        }
    }
}
