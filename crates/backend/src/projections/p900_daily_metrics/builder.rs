use crate::domain::cost_allocation::CostBreakdown;
use crate::shared::numeric::{percentage, ratio, round_money, safe_number};
use chrono::NaiveDate;
use contracts::domain::a001_order::aggregate::Order;
use contracts::domain::a002_transaction::aggregate::Refund;
use contracts::domain::a008_ad_insight::aggregate::AdInsight;
use contracts::domain::a009_analytics::aggregate::SessionAnalytics;
use contracts::projections::p900_daily_metrics::dto::{DailyMetric, MetricTotals};
use std::collections::HashSet;

/// Accumulates one date's contributions into a `DailyMetric`.
///
/// All accumulation is additive; every derived ratio is computed exactly
/// once in `finalize`, from the final sums.
pub struct DailyMetricBuilder {
    organization_id: String,
    date: NaiveDate,
    totals: MetricTotals,
    customer_ids: HashSet<String>,
    new_customer_ids: HashSet<String>,
}

impl DailyMetricBuilder {
    pub fn new(organization_id: &str, date: NaiveDate) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            date,
            totals: MetricTotals::default(),
            customer_ids: HashSet::new(),
            new_customer_ids: HashSet::new(),
        }
    }

    pub fn add_order(&mut self, order: &Order) {
        self.totals.orders_count += 1;
        self.totals.units_sold += order.total_quantity.max(0);
        self.totals.revenue += safe_number(order.total_price);
        self.totals.gross_sales += safe_number(order.gross_sales());
        self.totals.discounts += safe_number(order.total_discounts);
    }

    /// `is_new`: this date is the customer's first purchase date.
    pub fn add_customer(&mut self, customer_id: &str, is_new: bool) {
        if self.customer_ids.insert(customer_id.to_string()) && is_new {
            self.new_customer_ids.insert(customer_id.to_string());
        }
    }

    pub fn add_refund(&mut self, refund: &Refund) {
        self.totals.refunds += safe_number(refund.amount);
    }

    pub fn add_sessions(&mut self, analytics: &SessionAnalytics) {
        self.totals.sessions += analytics.sessions.max(0);
    }

    pub fn add_ad_insight(&mut self, insight: &AdInsight) {
        let spend = safe_number(insight.spend);
        let conversion_value = safe_number(insight.conversion_value);
        self.totals.ad_spend += spend;
        self.totals.impressions += insight.impressions.max(0);
        self.totals.clicks += insight.clicks.max(0);
        self.totals.conversions += safe_number(insight.conversions);
        self.totals.ad_conversion_value += conversion_value;
        self.totals.reach += insight.reach.max(0);
        self.totals.video_views += insight.video_views.max(0);
        self.totals.video_watch_time += safe_number(insight.video_watch_time);

        *self
            .totals
            .platform_ad_spend
            .entry(insight.platform.clone())
            .or_insert(0.0) += spend;
        *self
            .totals
            .platform_conversion_value
            .entry(insight.platform.clone())
            .or_insert(0.0) += conversion_value;
    }

    pub fn add_costs(&mut self, breakdown: &CostBreakdown) {
        self.totals.cogs += breakdown.cogs;
        self.totals.shipping_costs += breakdown.shipping;
        self.totals.handling_fees += breakdown.handling;
        self.totals.transaction_fees += breakdown.transaction_fees;
        self.totals.marketing_costs += breakdown.marketing;
        self.totals.operational_costs += breakdown.operational;
        self.totals.taxes_paid += breakdown.taxes;
    }

    /// Resolve the customer split, derive every ratio from the final sums
    /// and round to money precision.
    pub fn finalize(mut self) -> DailyMetric {
        self.totals.total_customers = self.customer_ids.len() as i64;
        self.totals.new_customers = self.new_customer_ids.len() as i64;
        self.totals.returning_customers =
            self.totals.total_customers - self.totals.new_customers;

        finalize_totals(&mut self.totals);

        DailyMetric {
            organization_id: self.organization_id,
            date: self.date,
            totals: self.totals,
        }
    }
}

/// Add `source`'s additive fields into `target`. Derived fields are left
/// alone; the caller recomputes them with `finalize_totals`.
pub fn add_additive(target: &mut MetricTotals, source: &MetricTotals) {
    target.orders_count += source.orders_count;
    target.units_sold += source.units_sold;
    target.total_customers += source.total_customers;
    target.new_customers += source.new_customers;
    target.returning_customers += source.returning_customers;
    target.sessions += source.sessions;

    target.revenue += source.revenue;
    target.gross_sales += source.gross_sales;
    target.discounts += source.discounts;
    target.refunds += source.refunds;

    target.cogs += source.cogs;
    target.shipping_costs += source.shipping_costs;
    target.handling_fees += source.handling_fees;
    target.transaction_fees += source.transaction_fees;
    target.marketing_costs += source.marketing_costs;
    target.operational_costs += source.operational_costs;
    target.taxes_paid += source.taxes_paid;

    target.ad_spend += source.ad_spend;
    target.impressions += source.impressions;
    target.clicks += source.clicks;
    target.conversions += source.conversions;
    target.ad_conversion_value += source.ad_conversion_value;
    target.reach += source.reach;
    target.video_views += source.video_views;
    target.video_watch_time += source.video_watch_time;
    for (platform, spend) in &source.platform_ad_spend {
        *target
            .platform_ad_spend
            .entry(platform.clone())
            .or_insert(0.0) += spend;
    }
    for (platform, value) in &source.platform_conversion_value {
        *target
            .platform_conversion_value
            .entry(platform.clone())
            .or_insert(0.0) += value;
    }
}

/// Compute every derived field from the additive sums, then round money and
/// ratio fields to 2 decimals. Customer counts must already be resolved.
pub fn finalize_totals(totals: &mut MetricTotals) {
    totals.custom_costs = totals.marketing_costs + totals.operational_costs;
    totals.total_costs = totals.cogs
        + totals.handling_fees
        + totals.ad_spend
        + totals.shipping_costs
        + totals.custom_costs
        + totals.transaction_fees
        + totals.taxes_paid;

    totals.gross_profit = totals.gross_sales - totals.cogs;
    totals.net_profit = totals.revenue - totals.total_costs;
    totals.gross_profit_margin = percentage(totals.gross_profit, totals.gross_sales);
    totals.net_profit_margin = percentage(totals.net_profit, totals.revenue);
    totals.contribution_margin = totals.revenue
        - (totals.cogs + totals.ad_spend + totals.shipping_costs + totals.transaction_fees);
    totals.contribution_margin_percentage =
        percentage(totals.contribution_margin, totals.revenue);
    totals.discount_rate = percentage(totals.discounts, totals.gross_sales);

    let orders = totals.orders_count as f64;
    totals.avg_order_value = ratio(totals.revenue, orders);
    totals.avg_order_cost = ratio(totals.total_costs, orders);
    totals.avg_order_profit = ratio(totals.net_profit, orders);
    totals.ad_spend_per_order = ratio(totals.ad_spend, orders);

    totals.repeat_customer_rate = percentage(
        totals.returning_customers as f64,
        totals.total_customers as f64,
    );
    totals.customer_acquisition_cost = ratio(totals.ad_spend, totals.new_customers as f64);

    totals.blended_roas = ratio(totals.revenue, totals.ad_spend);
    totals.platform_roas.clear();
    for (platform, spend) in &totals.platform_ad_spend {
        let conversion_value = totals
            .platform_conversion_value
            .get(platform)
            .copied()
            .unwrap_or(0.0);
        // Platform conversion value when reported, total revenue otherwise
        let attributed = if conversion_value > 0.0 {
            conversion_value
        } else {
            totals.revenue
        };
        totals
            .platform_roas
            .insert(platform.clone(), ratio(attributed, *spend));
    }

    round_totals(totals);
}

fn round_totals(totals: &mut MetricTotals) {
    totals.revenue = round_money(totals.revenue);
    totals.gross_sales = round_money(totals.gross_sales);
    totals.discounts = round_money(totals.discounts);
    totals.refunds = round_money(totals.refunds);

    totals.cogs = round_money(totals.cogs);
    totals.shipping_costs = round_money(totals.shipping_costs);
    totals.handling_fees = round_money(totals.handling_fees);
    totals.transaction_fees = round_money(totals.transaction_fees);
    totals.marketing_costs = round_money(totals.marketing_costs);
    totals.operational_costs = round_money(totals.operational_costs);
    totals.taxes_paid = round_money(totals.taxes_paid);

    totals.ad_spend = round_money(totals.ad_spend);
    totals.conversions = round_money(totals.conversions);
    totals.ad_conversion_value = round_money(totals.ad_conversion_value);
    totals.video_watch_time = round_money(totals.video_watch_time);
    for value in totals.platform_ad_spend.values_mut() {
        *value = round_money(*value);
    }
    for value in totals.platform_conversion_value.values_mut() {
        *value = round_money(*value);
    }

    totals.custom_costs = round_money(totals.custom_costs);
    totals.total_costs = round_money(totals.total_costs);
    totals.gross_profit = round_money(totals.gross_profit);
    totals.net_profit = round_money(totals.net_profit);
    totals.gross_profit_margin = round_money(totals.gross_profit_margin);
    totals.net_profit_margin = round_money(totals.net_profit_margin);
    totals.contribution_margin = round_money(totals.contribution_margin);
    totals.contribution_margin_percentage = round_money(totals.contribution_margin_percentage);
    totals.discount_rate = round_money(totals.discount_rate);
    totals.avg_order_value = round_money(totals.avg_order_value);
    totals.avg_order_cost = round_money(totals.avg_order_cost);
    totals.avg_order_profit = round_money(totals.avg_order_profit);
    totals.ad_spend_per_order = round_money(totals.ad_spend_per_order);
    totals.repeat_customer_rate = round_money(totals.repeat_customer_rate);
    totals.customer_acquisition_cost = round_money(totals.customer_acquisition_cost);
    totals.blended_roas = round_money(totals.blended_roas);
    for value in totals.platform_roas.values_mut() {
        *value = round_money(*value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        "2026-03-10".parse().unwrap()
    }

    fn order(id: &str, total: f64, subtotal: f64, discounts: f64, units: i64) -> Order {
        Order {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            created_at: 1_773_144_000_000,
            total_price: total,
            subtotal_price: subtotal,
            total_discounts: discounts,
            total_shipping_price: 0.0,
            total_tax: 0.0,
            total_quantity: units,
            customer_id: None,
            financial_status: Some("paid".to_string()),
            fulfillment_status: None,
        }
    }

    fn insight(platform: &str, spend: f64, conversion_value: f64) -> AdInsight {
        AdInsight {
            id: format!("ai-{}", platform),
            organization_id: "org-1".to_string(),
            platform: platform.to_string(),
            date: date(),
            spend,
            impressions: 1000,
            clicks: 40,
            conversions: 3.0,
            conversion_value,
            reach: 600,
            video_views: 10,
            video_watch_time: 120.0,
        }
    }

    #[test]
    fn test_empty_date_has_no_nan_or_infinity() {
        let metric = DailyMetricBuilder::new("org-1", date()).finalize();
        let t = &metric.totals;
        assert_eq!(t.net_profit_margin, 0.0);
        assert_eq!(t.gross_profit_margin, 0.0);
        assert_eq!(t.avg_order_value, 0.0);
        assert_eq!(t.blended_roas, 0.0);
        assert_eq!(t.customer_acquisition_cost, 0.0);
        assert_eq!(t.repeat_customer_rate, 0.0);
        assert_eq!(t.discount_rate, 0.0);
    }

    #[test]
    fn test_derived_fields_computed_from_sums() {
        let mut builder = DailyMetricBuilder::new("org-1", date());
        builder.add_order(&order("o-1", 100.0, 90.0, 10.0, 2));
        builder.add_order(&order("o-2", 50.0, 50.0, 0.0, 1));
        builder.add_costs(&CostBreakdown {
            cogs: 40.0,
            shipping: 5.0,
            handling: 0.0,
            transaction_fees: 4.5,
            marketing: 3.0,
            operational: 2.0,
            taxes: 0.0,
        });
        builder.add_ad_insight(&insight("meta", 30.0, 120.0));

        let metric = builder.finalize();
        let t = &metric.totals;
        assert_eq!(t.orders_count, 2);
        assert_eq!(t.revenue, 150.0);
        assert_eq!(t.gross_sales, 150.0);
        // 40 + 0 + 30 + 5 + (3 + 2) + 4.5 + 0
        assert_eq!(t.total_costs, 84.5);
        assert_eq!(t.custom_costs, 5.0);
        assert_eq!(t.gross_profit, 110.0);
        assert_eq!(t.net_profit, 65.5);
        assert_eq!(t.net_profit_margin, round_money(65.5 / 150.0 * 100.0));
        assert_eq!(t.avg_order_value, 75.0);
        assert_eq!(t.ad_spend_per_order, 15.0);
        assert_eq!(t.blended_roas, 5.0);
    }

    #[test]
    fn test_customer_split_and_acquisition_cost() {
        let mut builder = DailyMetricBuilder::new("org-1", date());
        builder.add_customer("c-1", true);
        builder.add_customer("c-2", false);
        builder.add_customer("c-2", true); // same customer again: no-op
        builder.add_customer("c-3", false);
        builder.add_ad_insight(&insight("meta", 50.0, 0.0));

        let metric = builder.finalize();
        let t = &metric.totals;
        assert_eq!(t.total_customers, 3);
        assert_eq!(t.new_customers, 1);
        assert_eq!(t.returning_customers, 2);
        assert_eq!(t.repeat_customer_rate, round_money(2.0 / 3.0 * 100.0));
        assert_eq!(t.customer_acquisition_cost, 50.0);
    }

    #[test]
    fn test_platform_roas_falls_back_to_revenue() {
        let mut builder = DailyMetricBuilder::new("org-1", date());
        builder.add_order(&order("o-1", 200.0, 200.0, 0.0, 1));
        builder.add_ad_insight(&insight("meta", 40.0, 120.0));
        builder.add_ad_insight(&insight("google", 25.0, 0.0));

        let metric = builder.finalize();
        let t = &metric.totals;
        // Meta has attributed conversion value
        assert_eq!(t.platform_roas["meta"], 3.0);
        // Google reported none: fall back to total revenue
        assert_eq!(t.platform_roas["google"], 8.0);
    }

    #[test]
    fn test_rollup_recomputes_rather_than_averages() {
        // Two days with very different volumes: the combined margin must
        // come from the summed totals, not the mean of the daily margins
        let mut day1 = MetricTotals::default();
        day1.revenue = 1000.0;
        day1.cogs = 900.0;
        day1.gross_sales = 1000.0;
        let mut day2 = MetricTotals::default();
        day2.revenue = 10.0;
        day2.cogs = 1.0;
        day2.gross_sales = 10.0;
        finalize_totals(&mut day1);
        finalize_totals(&mut day2);

        let mut combined = MetricTotals::default();
        add_additive(&mut combined, &day1);
        add_additive(&mut combined, &day2);
        finalize_totals(&mut combined);

        assert_eq!(combined.revenue, 1010.0);
        assert_eq!(combined.cogs, 901.0);
        let expected = round_money((1010.0 - 901.0) / 1010.0 * 100.0);
        assert_eq!(combined.net_profit_margin, expected);
        let averaged =
            round_money((day1.net_profit_margin + day2.net_profit_margin) / 2.0);
        assert_ne!(combined.net_profit_margin, averaged);
    }
}
