use crate::domain::cost_allocation::CalendarCostMode;
use crate::projections::p900_daily_metrics::context::RangeContext;
use crate::projections::p900_daily_metrics::service::build_daily_metric;
use crate::projections::p901_period_metrics;
use crate::shared::data::{DatasetReader, MetricStore};
use crate::usecases::u501_load_datasets::LoadExecutor;
use anyhow::Result;
use contracts::shared::date_range::DateRange;
use contracts::usecases::u501_load_datasets::request::LoadRequest;
use contracts::usecases::u502_rebuild_metrics::request::RebuildRequest;
use contracts::usecases::u502_rebuild_metrics::response::RebuildSummary;
use std::sync::Arc;
use uuid::Uuid;

/// Executor for the idempotent daily-metric rebuild.
///
/// One loader pass covers the whole requested span; loader failures abort
/// the run (allocation needs complete data for the dates it touches). A
/// date that fails on its own is recorded as skipped and the run continues.
/// Week/month rollups covering the touched dates are refreshed afterwards.
pub struct RebuildExecutor {
    loader: LoadExecutor,
    store: Arc<dyn MetricStore>,
}

impl RebuildExecutor {
    pub fn new(reader: Arc<dyn DatasetReader>, store: Arc<dyn MetricStore>) -> Self {
        Self {
            loader: LoadExecutor::new(reader),
            store,
        }
    }

    pub fn with_loader(loader: LoadExecutor, store: Arc<dyn MetricStore>) -> Self {
        Self { loader, store }
    }

    pub async fn rebuild_daily_metrics(&self, request: &RebuildRequest) -> Result<RebuildSummary> {
        let mut summary = RebuildSummary::default();
        if request.dates.is_empty() {
            return Ok(summary);
        }

        let mut dates = request.dates.clone();
        dates.sort();
        dates.dedup();
        let range = DateRange::new(dates[0], *dates.last().expect("dates is non-empty"))?;

        let run_id = Uuid::new_v4();
        tracing::info!(
            "Rebuilding daily metrics for {} across {} dates ({}..{}, run {})",
            request.organization_id,
            dates.len(),
            range.start_date,
            range.end_date,
            run_id
        );

        let data = self
            .loader
            .load(&LoadRequest::all(&request.organization_id, range))
            .await?;
        let ctx = RangeContext::build(&data);

        for date in &dates {
            summary.processed += 1;
            let mode = CalendarCostMode::Prorated {
                is_first_activity_date: ctx.first_activity_date() == Some(*date),
            };
            let metric = match build_daily_metric(&request.organization_id, *date, &ctx, mode) {
                Ok(metric) => metric,
                Err(e) => {
                    tracing::warn!("Skipping date {}: {}", date, e);
                    summary.skipped += 1;
                    summary.skipped_dates.push(*date);
                    continue;
                }
            };
            match self.store.upsert_daily(&metric).await {
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    tracing::warn!("Failed to store daily metric for {}: {}", date, e);
                    summary.skipped += 1;
                    summary.skipped_dates.push(*date);
                }
            }
        }

        p901_period_metrics::service::refresh_for_dates(
            self.store.as_ref(),
            &request.organization_id,
            &dates,
        )
        .await?;

        tracing::info!(
            "Rebuild for {} finished: processed={} updated={} skipped={} (run {})",
            request.organization_id,
            summary.processed,
            summary.updated,
            summary.skipped,
            run_id
        );
        Ok(summary)
    }
}
