pub mod memory;

use async_trait::async_trait;
use contracts::domain::a001_order::aggregate::{Order, OrderLineItem};
use contracts::domain::a002_transaction::aggregate::{OrderTransaction, Refund};
use contracts::domain::a003_product::aggregate::{Product, ProductVariant};
use contracts::domain::a004_customer::aggregate::Customer;
use contracts::domain::a005_fulfillment::aggregate::Fulfillment;
use contracts::domain::a006_variant_cost::aggregate::VariantCostComponent;
use contracts::domain::a007_cost_rule::aggregate::CostRule;
use contracts::domain::a008_ad_insight::aggregate::AdInsight;
use contracts::domain::a009_analytics::aggregate::{SessionAnalytics, ShopAnalytics};
use contracts::projections::p900_daily_metrics::dto::DailyMetric;
use contracts::projections::p901_period_metrics::dto::PeriodMetric;
use contracts::shared::date_range::DateRange;
use contracts::usecases::u501_load_datasets::request::DatasetKey;
use thiserror::Error;

/// Store-level failure raised by the paged table reader.
///
/// Quota violations are transient and handled by the loader with adaptive
/// page-size reduction; everything else aborts the run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read quota exceeded for {dataset} at page size {page_size}")]
    QuotaExceeded { dataset: String, page_size: u32 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One bounded fetch against a paged table.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub records: Vec<T>,
    /// Continuation token for the next fetch
    pub cursor: Option<String>,
    pub is_done: bool,
}

/// One page of the primary order-keyed track: the orders plus every related
/// record belonging to those orders.
#[derive(Debug, Clone, Default)]
pub struct OrderBundle {
    pub orders: Vec<Order>,
    pub line_items: Vec<OrderLineItem>,
    pub transactions: Vec<OrderTransaction>,
    pub refunds: Vec<Refund>,
    pub fulfillments: Vec<Fulfillment>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub variants: Vec<ProductVariant>,
    pub variant_cost_components: Vec<VariantCostComponent>,
}

#[derive(Debug, Clone)]
pub struct OrdersPage {
    pub bundle: OrderBundle,
    pub cursor: Option<String>,
    pub is_done: bool,
}

#[derive(Debug, Clone)]
pub enum DatasetPage {
    Orders(OrdersPage),
    AdInsights(Page<AdInsight>),
    GlobalCosts(Page<CostRule>),
    SessionAnalytics(Page<SessionAnalytics>),
    ShopAnalytics(Page<ShopAnalytics>),
}

#[derive(Debug, Clone)]
pub struct PageRequest {
    pub organization_id: String,
    pub date_range: DateRange,
    pub dataset: DatasetKey,
    pub cursor: Option<String>,
    pub page_size: u32,
}

/// Paged table reader provided by the persistence layer.
#[async_trait]
pub trait DatasetReader: Send + Sync {
    /// Fetch one page of the given dataset. Must raise
    /// `StoreError::QuotaExceeded` when the request's read volume is larger
    /// than the store's per-request ceiling.
    async fn fetch_page(&self, request: &PageRequest) -> Result<DatasetPage, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Persistence for the engine-owned metric projections: insert if absent,
/// patch otherwise. The engine never deletes metric records.
#[async_trait]
pub trait MetricStore: Send + Sync {
    async fn get_daily_range(
        &self,
        organization_id: &str,
        range: &DateRange,
    ) -> anyhow::Result<Vec<DailyMetric>>;

    async fn upsert_daily(&self, metric: &DailyMetric) -> anyhow::Result<UpsertOutcome>;

    async fn upsert_period(&self, metric: &PeriodMetric) -> anyhow::Result<UpsertOutcome>;
}

/// Stable record identity used by the loader's dedup maps.
pub trait RecordId {
    fn record_id(&self) -> &str;
}

macro_rules! impl_record_id {
    ($($ty:ty),+ $(,)?) => {
        $(impl RecordId for $ty {
            fn record_id(&self) -> &str {
                &self.id
            }
        })+
    };
}

impl_record_id!(
    Order,
    OrderLineItem,
    OrderTransaction,
    Refund,
    Fulfillment,
    Customer,
    Product,
    ProductVariant,
    VariantCostComponent,
    CostRule,
    AdInsight,
    SessionAnalytics,
    ShopAnalytics,
);
