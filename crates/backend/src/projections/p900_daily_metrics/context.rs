use crate::domain::cost_allocation::{ComponentIndex, LineItemIndex};
use chrono::NaiveDate;
use contracts::domain::a001_order::aggregate::Order;
use contracts::domain::a002_transaction::aggregate::Refund;
use contracts::domain::a007_cost_rule::aggregate::CostRule;
use contracts::domain::a008_ad_insight::aggregate::AdInsight;
use contracts::domain::a009_analytics::aggregate::SessionAnalytics;
use contracts::usecases::u501_load_datasets::response::RangeDatasets;
use std::collections::HashMap;

/// Per-run indexes over one loader result, shared by the allocation and
/// aggregation passes. Borrows the loaded data; scoped to one run, never
/// shared across concurrent runs.
pub struct RangeContext<'a> {
    pub line_items: LineItemIndex<'a>,
    pub components: ComponentIndex<'a>,
    pub cost_rules: &'a [CostRule],
    orders_by_date: HashMap<NaiveDate, Vec<&'a Order>>,
    refunds_by_date: HashMap<NaiveDate, Vec<&'a Refund>>,
    insights_by_date: HashMap<NaiveDate, Vec<&'a AdInsight>>,
    sessions_by_date: HashMap<NaiveDate, Vec<&'a SessionAnalytics>>,
    first_purchase: HashMap<&'a str, NaiveDate>,
    first_activity_date: Option<NaiveDate>,
}

impl<'a> RangeContext<'a> {
    pub fn build(data: &'a RangeDatasets) -> Self {
        let mut orders_by_date: HashMap<NaiveDate, Vec<&Order>> = HashMap::new();
        for order in &data.orders {
            match order.created_date() {
                Some(date) => orders_by_date.entry(date).or_default().push(order),
                None => tracing::warn!(
                    "Order {} has an unrepresentable timestamp, ignoring",
                    order.id
                ),
            }
        }

        let mut refunds_by_date: HashMap<NaiveDate, Vec<&Refund>> = HashMap::new();
        for refund in &data.refunds {
            if let Some(date) =
                chrono::DateTime::from_timestamp_millis(refund.processed_at).map(|dt| dt.date_naive())
            {
                refunds_by_date.entry(date).or_default().push(refund);
            }
        }

        let mut insights_by_date: HashMap<NaiveDate, Vec<&AdInsight>> = HashMap::new();
        for insight in &data.ad_insights {
            insights_by_date.entry(insight.date).or_default().push(insight);
        }

        let mut sessions_by_date: HashMap<NaiveDate, Vec<&SessionAnalytics>> = HashMap::new();
        for analytics in &data.session_analytics {
            sessions_by_date.entry(analytics.date).or_default().push(analytics);
        }

        // First purchase: the synced customer record when it knows, the
        // earliest order observed in this load otherwise
        let mut first_purchase: HashMap<&str, NaiveDate> = HashMap::new();
        for customer in &data.customers {
            if let Some(date) = customer.first_order_date() {
                first_purchase.insert(customer.id.as_str(), date);
            }
        }
        let mut observed_first: HashMap<&str, NaiveDate> = HashMap::new();
        for order in &data.orders {
            if let (Some(customer_id), Some(date)) = (&order.customer_id, order.created_date()) {
                observed_first
                    .entry(customer_id.as_str())
                    .and_modify(|d| {
                        if date < *d {
                            *d = date;
                        }
                    })
                    .or_insert(date);
            }
        }
        for (customer_id, date) in observed_first {
            first_purchase.entry(customer_id).or_insert(date);
        }

        let first_activity_date = orders_by_date
            .keys()
            .chain(refunds_by_date.keys())
            .chain(insights_by_date.keys())
            .chain(sessions_by_date.keys())
            .min()
            .copied();

        Self {
            line_items: LineItemIndex::build(&data.line_items),
            components: ComponentIndex::build(&data.variant_cost_components),
            cost_rules: &data.cost_rules,
            orders_by_date,
            refunds_by_date,
            insights_by_date,
            sessions_by_date,
            first_purchase,
            first_activity_date,
        }
    }

    pub fn orders_on(&self, date: NaiveDate) -> &[&'a Order] {
        self.orders_by_date
            .get(&date)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn refunds_on(&self, date: NaiveDate) -> &[&'a Refund] {
        self.refunds_by_date
            .get(&date)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn insights_on(&self, date: NaiveDate) -> &[&'a AdInsight] {
        self.insights_by_date
            .get(&date)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn sessions_on(&self, date: NaiveDate) -> &[&'a SessionAnalytics] {
        self.sessions_by_date
            .get(&date)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_purchase_date(&self, customer_id: &str) -> Option<NaiveDate> {
        self.first_purchase.get(customer_id).copied()
    }

    /// Earliest date with any activity in the loaded data; gates one-time
    /// cost charges.
    pub fn first_activity_date(&self) -> Option<NaiveDate> {
        self.first_activity_date
    }

    pub fn has_activity_on(&self, date: NaiveDate) -> bool {
        self.orders_by_date.contains_key(&date)
            || self.refunds_by_date.contains_key(&date)
            || self.insights_by_date.contains_key(&date)
            || self.sessions_by_date.contains_key(&date)
    }
}
