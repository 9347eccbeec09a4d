use super::{
    DatasetPage, DatasetReader, MetricStore, OrderBundle, OrdersPage, Page, PageRequest,
    StoreError, UpsertOutcome,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use contracts::projections::p900_daily_metrics::dto::DailyMetric;
use contracts::projections::p901_period_metrics::dto::{PeriodMetric, PeriodType};
use contracts::shared::date_range::DateRange;
use contracts::usecases::u501_load_datasets::request::DatasetKey;
use contracts::usecases::u501_load_datasets::response::RangeDatasets;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Fixture-backed dataset reader for tests and local runs.
///
/// Pages are offset-encoded cursors over pre-sorted records. A configurable
/// read ceiling simulates the store's per-request quota: any fetch asking
/// for more than `read_ceiling` records raises `QuotaExceeded`.
pub struct InMemoryDatasetReader {
    data: RangeDatasets,
    read_ceiling: Option<u32>,
    /// Dataset that always fails with a non-quota error
    fail_dataset: Option<DatasetKey>,
}

impl InMemoryDatasetReader {
    pub fn new(mut data: RangeDatasets) -> Self {
        data.orders.sort_by_key(|o| (o.created_at, o.id.clone()));
        Self {
            data,
            read_ceiling: None,
            fail_dataset: None,
        }
    }

    pub fn with_read_ceiling(mut self, ceiling: u32) -> Self {
        self.read_ceiling = Some(ceiling);
        self
    }

    pub fn with_failing_dataset(mut self, dataset: DatasetKey) -> Self {
        self.fail_dataset = Some(dataset);
        self
    }

    fn check_quota(&self, request: &PageRequest) -> Result<(), StoreError> {
        if let Some(ceiling) = self.read_ceiling {
            if request.page_size > ceiling {
                return Err(StoreError::QuotaExceeded {
                    dataset: request.dataset.as_str().to_string(),
                    page_size: request.page_size,
                });
            }
        }
        Ok(())
    }

    fn slice_page<T: Clone>(records: &[T], request: &PageRequest) -> Page<T> {
        let offset: usize = request
            .cursor
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        let end = (offset + request.page_size as usize).min(records.len());
        let page_records = records[offset..end].to_vec();
        let is_done = end >= records.len();
        Page {
            records: page_records,
            cursor: if is_done { None } else { Some(end.to_string()) },
            is_done,
        }
    }

    fn orders_page(&self, request: &PageRequest) -> OrdersPage {
        let in_scope: Vec<_> = self
            .data
            .orders
            .iter()
            .filter(|o| {
                o.organization_id == request.organization_id
                    && o.created_date()
                        .map(|d| request.date_range.contains(d))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();

        let page = Self::slice_page(&in_scope, request);
        let order_ids: HashSet<&str> = page.records.iter().map(|o| o.id.as_str()).collect();
        let customer_ids: HashSet<&str> = page
            .records
            .iter()
            .filter_map(|o| o.customer_id.as_deref())
            .collect();

        let line_items: Vec<_> = self
            .data
            .line_items
            .iter()
            .filter(|li| order_ids.contains(li.order_id.as_str()))
            .cloned()
            .collect();
        let variant_ids: HashSet<&str> = line_items.iter().map(|li| li.variant_id.as_str()).collect();
        let variants: Vec<_> = self
            .data
            .variants
            .iter()
            .filter(|v| variant_ids.contains(v.id.as_str()))
            .cloned()
            .collect();
        let product_ids: HashSet<&str> = variants.iter().map(|v| v.product_id.as_str()).collect();

        let transactions: Vec<_> = self
            .data
            .transactions
            .iter()
            .filter(|t| order_ids.contains(t.order_id.as_str()))
            .cloned()
            .collect();
        let refunds: Vec<_> = self
            .data
            .refunds
            .iter()
            .filter(|r| order_ids.contains(r.order_id.as_str()))
            .cloned()
            .collect();
        let fulfillments: Vec<_> = self
            .data
            .fulfillments
            .iter()
            .filter(|f| order_ids.contains(f.order_id.as_str()))
            .cloned()
            .collect();
        let customers: Vec<_> = self
            .data
            .customers
            .iter()
            .filter(|c| customer_ids.contains(c.id.as_str()))
            .cloned()
            .collect();
        let products: Vec<_> = self
            .data
            .products
            .iter()
            .filter(|p| product_ids.contains(p.id.as_str()))
            .cloned()
            .collect();
        let variant_cost_components: Vec<_> = self
            .data
            .variant_cost_components
            .iter()
            .filter(|c| variant_ids.contains(c.variant_id.as_str()))
            .cloned()
            .collect();

        OrdersPage {
            bundle: OrderBundle {
                orders: page.records,
                line_items,
                transactions,
                refunds,
                fulfillments,
                customers,
                products,
                variants,
                variant_cost_components,
            },
            cursor: page.cursor,
            is_done: page.is_done,
        }
    }
}

#[async_trait]
impl DatasetReader for InMemoryDatasetReader {
    async fn fetch_page(&self, request: &PageRequest) -> Result<DatasetPage, StoreError> {
        if self.fail_dataset == Some(request.dataset) {
            return Err(StoreError::Other(anyhow!(
                "simulated store failure for {}",
                request.dataset.as_str()
            )));
        }
        self.check_quota(request)?;

        let page = match request.dataset {
            DatasetKey::Orders => DatasetPage::Orders(self.orders_page(request)),
            DatasetKey::AdInsights => {
                let in_scope: Vec<_> = self
                    .data
                    .ad_insights
                    .iter()
                    .filter(|i| {
                        i.organization_id == request.organization_id
                            && request.date_range.contains(i.date)
                    })
                    .cloned()
                    .collect();
                DatasetPage::AdInsights(Self::slice_page(&in_scope, request))
            }
            DatasetKey::GlobalCosts => {
                let in_scope: Vec<_> = self
                    .data
                    .cost_rules
                    .iter()
                    .filter(|r| r.organization_id == request.organization_id)
                    .cloned()
                    .collect();
                DatasetPage::GlobalCosts(Self::slice_page(&in_scope, request))
            }
            DatasetKey::SessionAnalytics => {
                let in_scope: Vec<_> = self
                    .data
                    .session_analytics
                    .iter()
                    .filter(|s| {
                        s.organization_id == request.organization_id
                            && request.date_range.contains(s.date)
                    })
                    .cloned()
                    .collect();
                DatasetPage::SessionAnalytics(Self::slice_page(&in_scope, request))
            }
            DatasetKey::ShopAnalytics => {
                let in_scope: Vec<_> = self
                    .data
                    .shop_analytics
                    .iter()
                    .filter(|s| {
                        s.organization_id == request.organization_id
                            && request.date_range.contains(s.date)
                    })
                    .cloned()
                    .collect();
                DatasetPage::ShopAnalytics(Self::slice_page(&in_scope, request))
            }
        };

        Ok(page)
    }
}

/// In-memory metric store: one map per projection, keyed the same way the
/// persistent stores are.
#[derive(Default)]
pub struct InMemoryMetricStore {
    daily: RwLock<HashMap<(String, NaiveDate), DailyMetric>>,
    period: RwLock<HashMap<(String, PeriodType, String), PeriodMetric>>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn daily_count(&self) -> usize {
        self.daily.read().unwrap().len()
    }

    pub fn get_daily(&self, organization_id: &str, date: NaiveDate) -> Option<DailyMetric> {
        self.daily
            .read()
            .unwrap()
            .get(&(organization_id.to_string(), date))
            .cloned()
    }

    pub fn get_period(
        &self,
        organization_id: &str,
        period_type: PeriodType,
        period_key: &str,
    ) -> Option<PeriodMetric> {
        self.period
            .read()
            .unwrap()
            .get(&(
                organization_id.to_string(),
                period_type,
                period_key.to_string(),
            ))
            .cloned()
    }
}

#[async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn get_daily_range(
        &self,
        organization_id: &str,
        range: &DateRange,
    ) -> anyhow::Result<Vec<DailyMetric>> {
        let daily = self.daily.read().unwrap();
        let mut records: Vec<_> = daily
            .values()
            .filter(|m| m.organization_id == organization_id && range.contains(m.date))
            .cloned()
            .collect();
        records.sort_by_key(|m| m.date);
        Ok(records)
    }

    async fn upsert_daily(&self, metric: &DailyMetric) -> anyhow::Result<UpsertOutcome> {
        let mut daily = self.daily.write().unwrap();
        let key = (metric.organization_id.clone(), metric.date);
        let outcome = if daily.contains_key(&key) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        daily.insert(key, metric.clone());
        Ok(outcome)
    }

    async fn upsert_period(&self, metric: &PeriodMetric) -> anyhow::Result<UpsertOutcome> {
        let mut period = self.period.write().unwrap();
        let key = (
            metric.organization_id.clone(),
            metric.period_type,
            metric.period_key.clone(),
        );
        let outcome = if period.contains_key(&key) {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        period.insert(key, metric.clone());
        Ok(outcome)
    }
}
