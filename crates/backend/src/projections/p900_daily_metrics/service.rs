use super::builder::DailyMetricBuilder;
use super::context::RangeContext;
use crate::domain::cost_allocation::{allocate_date, CalendarCostMode};
use anyhow::Result;
use chrono::NaiveDate;
use contracts::projections::p900_daily_metrics::dto::DailyMetric;

/// Build the metric record for one (organization, date) from the loaded
/// range data. Fails only for malformed source records on this date; the
/// caller isolates such failures as "skipped" without aborting the run.
pub fn build_daily_metric(
    organization_id: &str,
    date: NaiveDate,
    ctx: &RangeContext,
    mode: CalendarCostMode,
) -> Result<DailyMetric> {
    let orders = ctx.orders_on(date);
    for order in orders {
        anyhow::ensure!(
            order.total_quantity >= 0,
            "order {} has a negative quantity",
            order.id
        );
    }

    let mut builder = DailyMetricBuilder::new(organization_id, date);
    for order in orders {
        builder.add_order(order);
        if let Some(customer_id) = &order.customer_id {
            let is_new = ctx.first_purchase_date(customer_id) == Some(date);
            builder.add_customer(customer_id, is_new);
        }
    }
    for refund in ctx.refunds_on(date) {
        builder.add_refund(refund);
    }
    for insight in ctx.insights_on(date) {
        builder.add_ad_insight(insight);
    }
    for analytics in ctx.sessions_on(date) {
        builder.add_sessions(analytics);
    }

    let breakdown = allocate_date(
        date,
        orders,
        &ctx.line_items,
        &ctx.components,
        ctx.cost_rules,
        mode,
    );
    builder.add_costs(&breakdown);

    Ok(builder.finalize())
}
