pub mod a001_order;
pub mod a002_transaction;
pub mod a003_product;
pub mod a004_customer;
pub mod a005_fulfillment;
pub mod a006_variant_cost;
pub mod a007_cost_rule;
pub mod a008_ad_insight;
pub mod a009_analytics;
