use serde::{Deserialize, Serialize};

/// Catalog product, carried along the primary order track as reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub organization_id: String,
    pub title: String,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}

/// Sellable variant of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub product_id: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub title: String,
    pub price: f64,
}
