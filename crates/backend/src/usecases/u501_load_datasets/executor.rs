use super::identity_map::IdentityMap;
use crate::shared::config::{get_config, LoaderConfig};
use crate::shared::data::{DatasetPage, DatasetReader, Page, PageRequest, RecordId, StoreError};
use anyhow::Result;
use contracts::usecases::u501_load_datasets::request::{DatasetKey, LoadRequest};
use contracts::usecases::u501_load_datasets::response::{LoadMetadata, RangeDatasets};
use std::sync::Arc;

/// Executor for the chunked dataset loader.
///
/// Pages every requested dataset out of the store under its per-request
/// read ceiling: on a quota violation the current page size is halved (not
/// below the floor) and the same cursor is retried, so no record is skipped
/// or duplicated. The run is read-only; nothing is committed anywhere.
pub struct LoadExecutor {
    reader: Arc<dyn DatasetReader>,
    config: LoaderConfig,
}

impl LoadExecutor {
    pub fn new(reader: Arc<dyn DatasetReader>) -> Self {
        Self {
            reader,
            config: get_config().loader.clone(),
        }
    }

    pub fn with_config(reader: Arc<dyn DatasetReader>, config: LoaderConfig) -> Self {
        Self { reader, config }
    }

    /// Load every dataset in the request's allow-list for the organization
    /// and date range. Datasets outside the allow-list come back as empty
    /// arrays, not absent.
    pub async fn load(&self, request: &LoadRequest) -> Result<RangeDatasets> {
        if request.date_range.end_date < request.date_range.start_date {
            anyhow::bail!(
                "invalid date range: start {} is after end {}",
                request.date_range.start_date,
                request.date_range.end_date
            );
        }

        let mut result = RangeDatasets::default();
        let mut metadata = LoadMetadata::default();
        tracing::info!(
            "Loading datasets for organization {} range {}..{} (run {})",
            request.organization_id,
            request.date_range.start_date,
            request.date_range.end_date,
            metadata.run_id
        );

        if request.wants(DatasetKey::Orders) {
            self.load_order_track(request, &mut result, &mut metadata)
                .await?;
        }
        if request.wants(DatasetKey::AdInsights) {
            result.ad_insights = self
                .load_supplemental(
                    request,
                    DatasetKey::AdInsights,
                    |page| match page {
                        DatasetPage::AdInsights(p) => Ok(p),
                        _ => Err(anyhow::anyhow!(
                            "store returned a mismatched page for ad_insights"
                        )),
                    },
                    &mut metadata,
                )
                .await?;
        }
        if request.wants(DatasetKey::GlobalCosts) {
            result.cost_rules = self
                .load_supplemental(
                    request,
                    DatasetKey::GlobalCosts,
                    |page| match page {
                        DatasetPage::GlobalCosts(p) => Ok(p),
                        _ => Err(anyhow::anyhow!(
                            "store returned a mismatched page for global_costs"
                        )),
                    },
                    &mut metadata,
                )
                .await?;
        }
        if request.wants(DatasetKey::SessionAnalytics) {
            result.session_analytics = self
                .load_supplemental(
                    request,
                    DatasetKey::SessionAnalytics,
                    |page| match page {
                        DatasetPage::SessionAnalytics(p) => Ok(p),
                        _ => Err(anyhow::anyhow!(
                            "store returned a mismatched page for session_analytics"
                        )),
                    },
                    &mut metadata,
                )
                .await?;
        }
        if request.wants(DatasetKey::ShopAnalytics) {
            result.shop_analytics = self
                .load_supplemental(
                    request,
                    DatasetKey::ShopAnalytics,
                    |page| match page {
                        DatasetPage::ShopAnalytics(p) => Ok(p),
                        _ => Err(anyhow::anyhow!(
                            "store returned a mismatched page for shop_analytics"
                        )),
                    },
                    &mut metadata,
                )
                .await?;
        }

        tracing::info!(
            "Loaded {} orders, {} line items, {} cost rules, {} ad insights (run {})",
            result.orders.len(),
            result.line_items.len(),
            result.cost_rules.len(),
            result.ad_insights.len(),
            metadata.run_id
        );
        if let Ok(metadata_json) = serde_json::to_string(&metadata) {
            tracing::debug!("Load metadata: {}", metadata_json);
        }
        result.metadata = metadata;
        Ok(result)
    }

    /// Primary track: pages orders by creation time; every page also
    /// carries the child rows and reference records for its orders.
    async fn load_order_track(
        &self,
        request: &LoadRequest,
        result: &mut RangeDatasets,
        metadata: &mut LoadMetadata,
    ) -> Result<()> {
        let mut page_size = self.config.order_page_size.max(1);
        let floor = self.config.order_page_floor.max(1);
        let mut cursor: Option<String> = None;

        let mut orders = IdentityMap::new();
        let mut line_items = IdentityMap::new();
        let mut transactions = IdentityMap::new();
        let mut refunds = IdentityMap::new();
        let mut fulfillments = IdentityMap::new();
        let mut customers = IdentityMap::new();
        let mut products = IdentityMap::new();
        let mut variants = IdentityMap::new();
        let mut components = IdentityMap::new();

        loop {
            let page = self
                .fetch_with_backoff(
                    request,
                    DatasetKey::Orders,
                    &cursor,
                    &mut page_size,
                    floor,
                    metadata,
                )
                .await?;
            let DatasetPage::Orders(page) = page else {
                anyhow::bail!("store returned a mismatched page for the orders dataset");
            };

            let bundle = page.bundle;
            for order in bundle.orders {
                if let Some(max) = request.limits.max_orders {
                    if orders.len() >= max {
                        if !metadata.truncated_orders {
                            tracing::info!(
                                "Order limit {} reached, truncating the primary track",
                                max
                            );
                        }
                        metadata.truncated_orders = true;
                        break;
                    }
                }
                let id = order.id.clone();
                orders.insert(&id, order);
            }

            // Child rows only for orders that were kept
            for record in bundle.line_items {
                if orders.contains(&record.order_id) {
                    let id = record.id.clone();
                    line_items.insert(&id, record);
                }
            }
            for record in bundle.transactions {
                if orders.contains(&record.order_id) {
                    let id = record.id.clone();
                    transactions.insert(&id, record);
                }
            }
            for record in bundle.refunds {
                if orders.contains(&record.order_id) {
                    let id = record.id.clone();
                    refunds.insert(&id, record);
                }
            }
            for record in bundle.fulfillments {
                if orders.contains(&record.order_id) {
                    let id = record.id.clone();
                    fulfillments.insert(&id, record);
                }
            }

            // Reference data overlaps between pages; the identity maps dedup it
            for record in bundle.customers {
                let id = record.id.clone();
                customers.insert(&id, record);
            }
            for record in bundle.products {
                let id = record.id.clone();
                products.insert(&id, record);
            }
            for record in bundle.variants {
                let id = record.id.clone();
                variants.insert(&id, record);
            }
            for record in bundle.variant_cost_components {
                let id = record.id.clone();
                components.insert(&id, record);
            }

            if metadata.truncated_orders {
                break;
            }
            if page.is_done && page.cursor.is_none() {
                break;
            }
            if page.cursor.is_none() {
                tracing::warn!("Orders page returned no cursor before completion, stopping");
                break;
            }
            cursor = page.cursor;
        }

        result.orders = orders.into_vec();
        result.line_items = line_items.into_vec();
        result.transactions = transactions.into_vec();
        result.refunds = refunds.into_vec();
        result.fulfillments = fulfillments.into_vec();
        result.customers = customers.into_vec();
        result.products = products.into_vec();
        result.variants = variants.into_vec();
        result.variant_cost_components = components.into_vec();
        Ok(())
    }

    /// Supplemental track: one independently-cursored dataset.
    async fn load_supplemental<T, F>(
        &self,
        request: &LoadRequest,
        dataset: DatasetKey,
        extract: F,
        metadata: &mut LoadMetadata,
    ) -> Result<Vec<T>>
    where
        T: RecordId,
        F: Fn(DatasetPage) -> Result<Page<T>>,
    {
        let (mut page_size, floor) = self.supplemental_sizing(dataset);
        let mut cursor: Option<String> = None;
        let mut records = IdentityMap::new();

        loop {
            let page = self
                .fetch_with_backoff(request, dataset, &cursor, &mut page_size, floor, metadata)
                .await?;
            let page = extract(page)?;
            for record in page.records {
                let id = record.record_id().to_string();
                records.insert(&id, record);
            }
            if page.is_done && page.cursor.is_none() {
                break;
            }
            if page.cursor.is_none() {
                tracing::warn!(
                    "{} page returned no cursor before completion, stopping",
                    dataset.as_str()
                );
                break;
            }
            cursor = page.cursor;
        }

        tracing::debug!("Loaded {} {} records", records.len(), dataset.as_str());
        Ok(records.into_vec())
    }

    fn supplemental_sizing(&self, dataset: DatasetKey) -> (u32, u32) {
        let size = match dataset {
            DatasetKey::ShopAnalytics => self.config.secondary_page_size,
            _ => self.config.supplemental_page_size,
        };
        (size.max(1), self.config.supplemental_page_floor.max(1))
    }

    /// Fetch one page, halving the page size (down to the floor) and
    /// retrying the same cursor on quota violations. A quota error at the
    /// floor is fatal. `page_size` keeps the shrunken size for the rest of
    /// the dataset.
    async fn fetch_with_backoff(
        &self,
        request: &LoadRequest,
        dataset: DatasetKey,
        cursor: &Option<String>,
        page_size: &mut u32,
        floor: u32,
        metadata: &mut LoadMetadata,
    ) -> Result<DatasetPage, StoreError> {
        loop {
            let page_request = PageRequest {
                organization_id: request.organization_id.clone(),
                date_range: request.date_range,
                dataset,
                cursor: cursor.clone(),
                page_size: *page_size,
            };
            match self.reader.fetch_page(&page_request).await {
                Ok(page) => {
                    *metadata
                        .pages_fetched
                        .entry(dataset.as_str().to_string())
                        .or_insert(0) += 1;
                    return Ok(page);
                }
                Err(StoreError::QuotaExceeded { .. }) if *page_size > floor => {
                    let reduced = (*page_size / 2).max(floor);
                    tracing::warn!(
                        "Read quota exceeded for {} at page size {}, retrying the same cursor at {}",
                        dataset.as_str(),
                        *page_size,
                        reduced
                    );
                    *page_size = reduced;
                    *metadata
                        .page_size_reductions
                        .entry(dataset.as_str().to_string())
                        .or_insert(0) += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
