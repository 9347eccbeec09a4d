use crate::domain::cost_allocation::{
    allocate_order, allocate_range_fixed, CalendarCostMode, OrderAllocation,
};
use crate::projections::p900_daily_metrics::builder::{add_additive, finalize_totals};
use crate::projections::p900_daily_metrics::context::RangeContext;
use crate::projections::p900_daily_metrics::service::build_daily_metric;
use crate::projections::p901_period_metrics::service::rollup;
use crate::shared::data::DatasetReader;
use crate::shared::numeric::round_money;
use crate::usecases::u501_load_datasets::LoadExecutor;
use anyhow::Result;
use contracts::dashboards::d400_range_analytics::{
    Granularity, OrderProfitRow, PeriodRow, RangeAnalyticsRequest, RangeAnalyticsResponse,
};
use contracts::domain::a001_order::aggregate::Order;
use contracts::projections::p900_daily_metrics::dto::{DailyMetric, MetricTotals};
use contracts::projections::p901_period_metrics::dto::PeriodType;
use contracts::shared::date_range::{month_key, week_key};
use contracts::usecases::u501_load_datasets::request::LoadRequest;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read-only range analytics for the dashboard layer.
///
/// Side-effect free: nothing is upserted; every figure is computed from a
/// fresh loader pass over the range.
pub struct RangeAnalyticsService {
    loader: LoadExecutor,
}

impl RangeAnalyticsService {
    pub fn new(reader: Arc<dyn DatasetReader>) -> Self {
        Self {
            loader: LoadExecutor::new(reader),
        }
    }

    pub fn with_loader(loader: LoadExecutor) -> Self {
        Self { loader }
    }

    pub async fn compute_range_analytics(
        &self,
        request: &RangeAnalyticsRequest,
    ) -> Result<RangeAnalyticsResponse> {
        let mut data = self
            .loader
            .load(&LoadRequest::all(
                &request.organization_id,
                request.date_range,
            ))
            .await?;

        if let Some(status) = &request.filters.financial_status {
            data.orders
                .retain(|o| o.financial_status.as_deref() == Some(status.as_str()));
        }
        let ctx = RangeContext::build(&data);

        // Per-order breakdown, single-order allocation
        let mut per_order_breakdown = Vec::with_capacity(data.orders.len());
        for order in &data.orders {
            let allocation = allocate_order(
                order,
                ctx.line_items.for_order(&order.id),
                &ctx.components,
                ctx.cost_rules,
            );
            per_order_breakdown.push(order_row(order, &allocation));
        }

        // Period table from per-date allocations (calendar pro-rating)
        let mut daily_metrics: Vec<DailyMetric> = Vec::new();
        for date in request.date_range.days() {
            if !ctx.has_activity_on(date) {
                continue;
            }
            let mode = CalendarCostMode::Prorated {
                is_first_activity_date: ctx.first_activity_date() == Some(date),
            };
            match build_daily_metric(&request.organization_id, date, &ctx, mode) {
                Ok(metric) => daily_metrics.push(metric),
                Err(e) => tracing::warn!("Skipping date {} in range analytics: {}", date, e),
            }
        }
        let period_table = build_period_table(
            &request.organization_id,
            &daily_metrics,
            request.filters.granularity,
        );

        // Overview: order-driven figures summed across the range,
        // calendar-cadence fixed rules allocated time-bound over it
        let mut overview = MetricTotals::default();
        for date in request.date_range.days() {
            if !ctx.has_activity_on(date) {
                continue;
            }
            match build_daily_metric(
                &request.organization_id,
                date,
                &ctx,
                CalendarCostMode::Excluded,
            ) {
                Ok(metric) => add_additive(&mut overview, &metric.totals),
                Err(e) => tracing::warn!("Skipping date {} in overview: {}", date, e),
            }
        }
        let range_fixed = allocate_range_fixed(ctx.cost_rules, &request.date_range);
        overview.cogs += range_fixed.cogs;
        overview.shipping_costs += range_fixed.shipping;
        overview.handling_fees += range_fixed.handling;
        overview.transaction_fees += range_fixed.transaction_fees;
        overview.marketing_costs += range_fixed.marketing;
        overview.operational_costs += range_fixed.operational;
        overview.taxes_paid += range_fixed.taxes;
        finalize_totals(&mut overview);

        Ok(RangeAnalyticsResponse {
            overview,
            per_order_breakdown,
            period_table,
        })
    }
}

fn order_row(order: &Order, allocation: &OrderAllocation) -> OrderProfitRow {
    let breakdown = &allocation.breakdown;
    OrderProfitRow {
        order_id: order.id.clone(),
        date: order.created_date().unwrap_or_default(),
        revenue: round_money(allocation.revenue),
        units: order.total_quantity.max(0),
        cogs: round_money(breakdown.cogs),
        shipping_cost: round_money(breakdown.shipping),
        handling_fee: round_money(breakdown.handling),
        transaction_fees: round_money(breakdown.transaction_fees),
        marketing_cost: round_money(breakdown.marketing),
        operational_cost: round_money(breakdown.operational),
        taxes: round_money(breakdown.taxes),
        total_cost: round_money(allocation.total_cost),
        profit: round_money(allocation.profit),
        profit_margin: round_money(allocation.profit_margin),
    }
}

fn build_period_table(
    organization_id: &str,
    daily_metrics: &[DailyMetric],
    granularity: Granularity,
) -> Vec<PeriodRow> {
    match granularity {
        Granularity::Day => daily_metrics
            .iter()
            .map(|metric| PeriodRow {
                period_key: metric.date.to_string(),
                days_included: 1,
                totals: metric.totals.clone(),
            })
            .collect(),
        Granularity::Week | Granularity::Month => {
            let mut groups: BTreeMap<String, Vec<DailyMetric>> = BTreeMap::new();
            for metric in daily_metrics {
                let key = match granularity {
                    Granularity::Week => week_key(metric.date),
                    _ => month_key(metric.date),
                };
                groups.entry(key).or_default().push(metric.clone());
            }
            let period_type = match granularity {
                Granularity::Week => PeriodType::Week,
                _ => PeriodType::Month,
            };
            groups
                .into_iter()
                .map(|(key, dailies)| {
                    let metric = rollup(organization_id, period_type, &key, &dailies);
                    PeriodRow {
                        period_key: key,
                        days_included: metric.days_included,
                        totals: metric.totals,
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::LoaderConfig;
    use crate::shared::data::memory::InMemoryDatasetReader;
    use contracts::dashboards::d400_range_analytics::AnalyticsFilters;
    use contracts::domain::a001_order::aggregate::OrderLineItem;
    use contracts::domain::a006_variant_cost::aggregate::VariantCostComponent;
    use contracts::domain::a007_cost_rule::aggregate::{
        CostCalculation, CostFrequency, CostRule, CostRuleConfig, CostType,
    };
    use contracts::shared::date_range::DateRange;
    use contracts::usecases::u501_load_datasets::response::RangeDatasets;
    use chrono::NaiveDate;

    fn ts(date: &str) -> i64 {
        date.parse::<NaiveDate>()
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    fn order(id: &str, date: &str, total: f64, status: &str) -> Order {
        Order {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            created_at: ts(date),
            total_price: total,
            subtotal_price: total,
            total_discounts: 0.0,
            total_shipping_price: 0.0,
            total_tax: 0.0,
            total_quantity: 1,
            customer_id: None,
            financial_status: Some(status.to_string()),
            fulfillment_status: None,
        }
    }

    fn service(data: RangeDatasets) -> RangeAnalyticsService {
        let reader = Arc::new(InMemoryDatasetReader::new(data));
        RangeAnalyticsService::with_loader(LoadExecutor::with_config(
            reader,
            LoaderConfig::default(),
        ))
    }

    fn request(start: &str, end: &str) -> RangeAnalyticsRequest {
        RangeAnalyticsRequest {
            organization_id: "org-1".to_string(),
            date_range: DateRange::parse(start, end).unwrap(),
            filters: AnalyticsFilters::default(),
        }
    }

    #[tokio::test]
    async fn test_empty_dataset_returns_zeroed_overview() {
        let analytics = service(RangeDatasets::default());
        let response = analytics
            .compute_range_analytics(&request("2026-03-01", "2026-03-31"))
            .await
            .unwrap();

        assert_eq!(response.overview.revenue, 0.0);
        assert_eq!(response.overview.net_profit_margin, 0.0);
        assert_eq!(response.overview.blended_roas, 0.0);
        assert!(response.per_order_breakdown.is_empty());
        assert!(response.period_table.is_empty());
    }

    #[tokio::test]
    async fn test_per_order_breakdown_with_override_and_rule() {
        let mut data = RangeDatasets::default();
        data.orders.push(order("o-1", "2026-03-09", 100.0, "paid"));
        data.line_items.push(OrderLineItem {
            id: "li-1".to_string(),
            order_id: "o-1".to_string(),
            variant_id: "v-1".to_string(),
            quantity: 2,
            unit_price: 50.0,
            line_discount: 0.0,
        });
        data.variant_cost_components.push(VariantCostComponent {
            id: "vc-1".to_string(),
            organization_id: "org-1".to_string(),
            variant_id: "v-1".to_string(),
            cogs_per_unit: 20.0,
            shipping_per_unit: 0.0,
            handling_per_unit: 0.0,
            payment_fee_percent: 0.0,
            payment_fixed_per_item: 0.0,
            effective_from: None,
            effective_to: None,
            is_active: true,
        });
        data.cost_rules.push(CostRule {
            id: "r-1".to_string(),
            organization_id: "org-1".to_string(),
            name: "product cost".to_string(),
            cost_type: CostType::Product,
            calculation: CostCalculation::Percentage,
            frequency: CostFrequency::PerOrder,
            value: 5.0,
            effective_from: None,
            effective_to: None,
            is_active: true,
            config: CostRuleConfig::None,
        });

        let analytics = service(data);
        let response = analytics
            .compute_range_analytics(&request("2026-03-01", "2026-03-31"))
            .await
            .unwrap();

        assert_eq!(response.per_order_breakdown.len(), 1);
        let row = &response.per_order_breakdown[0];
        // Covered revenue stays out of the 5% rule: COGS is the override's 40
        assert_eq!(row.cogs, 40.0);
        assert_eq!(row.profit, 60.0);
        assert_eq!(row.profit_margin, 60.0);

        assert_eq!(response.overview.revenue, 100.0);
        assert_eq!(response.overview.cogs, 40.0);
        assert_eq!(response.period_table.len(), 1);
        assert_eq!(response.period_table[0].period_key, "2026-03-09");
    }

    #[tokio::test]
    async fn test_financial_status_filter() {
        let mut data = RangeDatasets::default();
        data.orders.push(order("o-1", "2026-03-09", 100.0, "paid"));
        data.orders.push(order("o-2", "2026-03-09", 70.0, "pending"));

        let analytics = service(data);
        let mut req = request("2026-03-01", "2026-03-31");
        req.filters.financial_status = Some("paid".to_string());
        let response = analytics.compute_range_analytics(&req).await.unwrap();

        assert_eq!(response.per_order_breakdown.len(), 1);
        assert_eq!(response.overview.revenue, 100.0);
    }

    #[tokio::test]
    async fn test_weekly_granularity_groups_dates() {
        let mut data = RangeDatasets::default();
        // Monday and Tuesday of one ISO week, Monday of the next
        data.orders.push(order("o-1", "2026-03-09", 100.0, "paid"));
        data.orders.push(order("o-2", "2026-03-10", 50.0, "paid"));
        data.orders.push(order("o-3", "2026-03-16", 30.0, "paid"));

        let analytics = service(data);
        let mut req = request("2026-03-01", "2026-03-31");
        req.filters.granularity = Granularity::Week;
        let response = analytics.compute_range_analytics(&req).await.unwrap();

        assert_eq!(response.period_table.len(), 2);
        assert_eq!(response.period_table[0].period_key, "2026-W11");
        assert_eq!(response.period_table[0].days_included, 2);
        assert_eq!(response.period_table[0].totals.revenue, 150.0);
        assert_eq!(response.period_table[1].totals.revenue, 30.0);
    }

    #[tokio::test]
    async fn test_overview_uses_time_bound_fixed_allocation() {
        let mut data = RangeDatasets::default();
        data.orders.push(order("o-1", "2026-01-10", 100.0, "paid"));
        // 100/month operational cost effective through January only
        data.cost_rules.push(CostRule {
            id: "r-1".to_string(),
            organization_id: "org-1".to_string(),
            name: "warehouse rent".to_string(),
            cost_type: CostType::Operational,
            calculation: CostCalculation::Fixed,
            frequency: CostFrequency::Monthly,
            value: 100.0,
            effective_from: Some(ts("2026-01-01") - 43_200_000),
            effective_to: Some(ts("2026-02-01") - 43_200_000),
            is_active: true,
            config: CostRuleConfig::None,
        });

        let analytics = service(data);
        let response = analytics
            .compute_range_analytics(&request("2026-01-01", "2026-01-31"))
            .await
            .unwrap();

        // The whole window falls inside the range
        assert_eq!(response.overview.operational_costs, 100.0);
        // The day table still pro-rates per calendar day
        assert_eq!(response.period_table.len(), 1);
        let day = &response.period_table[0];
        assert_eq!(day.totals.operational_costs, round_money(100.0 / 31.0));
    }
}
