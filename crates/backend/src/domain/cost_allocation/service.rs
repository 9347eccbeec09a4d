use super::component_resolver::ComponentIndex;
use super::coverage::RevenueCoverage;
use super::proration::{daily_share, time_bound_share};
use crate::shared::numeric::{percentage, safe_number};
use chrono::NaiveDate;
use contracts::domain::a001_order::aggregate::{Order, OrderLineItem};
use contracts::domain::a007_cost_rule::aggregate::{
    CostCalculation, CostFrequency, CostRule, CostType,
};
use contracts::shared::date_range::DateRange;
use std::collections::HashMap;

/// Cost buckets accumulated for one order, one date, or one range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostBreakdown {
    pub cogs: f64,
    pub shipping: f64,
    pub handling: f64,
    pub transaction_fees: f64,
    pub marketing: f64,
    pub operational: f64,
    pub taxes: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.cogs
            + self.shipping
            + self.handling
            + self.transaction_fees
            + self.marketing
            + self.operational
            + self.taxes
    }

    pub fn add(&mut self, other: &CostBreakdown) {
        self.cogs += other.cogs;
        self.shipping += other.shipping;
        self.handling += other.handling;
        self.transaction_fees += other.transaction_fees;
        self.marketing += other.marketing;
        self.operational += other.operational;
        self.taxes += other.taxes;
    }

    fn bucket_mut(&mut self, cost_type: CostType) -> &mut f64 {
        match cost_type {
            CostType::Product => &mut self.cogs,
            CostType::Shipping => &mut self.shipping,
            CostType::Handling => &mut self.handling,
            CostType::Payment => &mut self.transaction_fees,
            CostType::Marketing => &mut self.marketing,
            CostType::Operational => &mut self.operational,
            CostType::Tax => &mut self.taxes,
        }
    }
}

/// Line items indexed by order id, scoped to one run.
pub struct LineItemIndex<'a> {
    by_order: HashMap<&'a str, Vec<&'a OrderLineItem>>,
}

impl<'a> LineItemIndex<'a> {
    pub fn build(items: &'a [OrderLineItem]) -> Self {
        let mut by_order: HashMap<&str, Vec<&OrderLineItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id.as_str()).or_default().push(item);
        }
        Self { by_order }
    }

    pub fn for_order(&self, order_id: &str) -> &[&'a OrderLineItem] {
        self.by_order
            .get(order_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Result of allocating a single order.
#[derive(Debug, Clone, Copy)]
pub struct OrderAllocation {
    pub breakdown: CostBreakdown,
    pub revenue: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub profit_margin: f64,
}

/// How date-level allocation treats calendar-cadence fixed rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalendarCostMode {
    /// Pro-rate into this date (daily/weekly/monthly/quarterly/yearly);
    /// one-time costs land on the range's first activity date.
    Prorated { is_first_activity_date: bool },
    /// Leave them out; the caller allocates them time-bound over the range.
    Excluded,
}

/// Variant-tier allocation: resolve each line's applicable cost component
/// into the buckets and record the covered revenue slices.
fn apply_variant_overrides(
    order_ts: i64,
    line_items: &[&OrderLineItem],
    components: &ComponentIndex,
    breakdown: &mut CostBreakdown,
    coverage: &mut RevenueCoverage,
) {
    for line in line_items {
        let Some(component) = components.resolve(&line.variant_id, order_ts) else {
            continue;
        };
        let quantity = line.quantity as f64;
        let line_revenue = safe_number(line.net_revenue());

        if component.cogs_per_unit > 0.0 {
            breakdown.cogs += safe_number(component.cogs_per_unit) * quantity;
            coverage.cover_cogs(line_revenue);
        }
        if component.shipping_per_unit > 0.0 {
            breakdown.shipping += safe_number(component.shipping_per_unit) * quantity;
        }
        if component.handling_per_unit > 0.0 {
            breakdown.handling += safe_number(component.handling_per_unit) * quantity;
        }
        if component.payment_fee_percent > 0.0 {
            breakdown.transaction_fees +=
                safe_number(component.payment_fee_percent) / 100.0 * line_revenue;
            coverage.cover_payment(line_revenue);
        }
        if component.payment_fixed_per_item > 0.0 {
            breakdown.transaction_fees +=
                safe_number(component.payment_fixed_per_item) * quantity;
        }
    }
}

/// Full per-order allocation: variant overrides first, then org-level rules
/// against the uncovered remainder.
pub fn allocate_order(
    order: &Order,
    line_items: &[&OrderLineItem],
    components: &ComponentIndex,
    rules: &[CostRule],
) -> OrderAllocation {
    let mut breakdown = CostBreakdown::default();
    let mut coverage = RevenueCoverage::default();

    apply_variant_overrides(order.created_at, line_items, components, &mut breakdown, &mut coverage);

    let order_revenue = safe_number(order.total_price);
    let gross_sales = safe_number(order.gross_sales());
    let total_units = order.total_quantity.max(0) as f64;

    for rule in rules {
        if !rule.active_at(order.created_at) {
            continue;
        }
        let value = safe_number(rule.value);
        match rule.calculation {
            CostCalculation::Percentage => match rule.cost_type {
                CostType::Product => {
                    breakdown.cogs += value / 100.0 * coverage.uncovered_cogs(gross_sales);
                }
                CostType::Payment => {
                    breakdown.transaction_fees +=
                        value / 100.0 * coverage.uncovered_payment(order_revenue);
                    breakdown.transaction_fees += safe_number(rule.fixed_fee());
                }
                other => {
                    *breakdown.bucket_mut(other) += value / 100.0 * order_revenue;
                }
            },
            CostCalculation::Fixed => match rule.frequency {
                CostFrequency::PerOrder => {
                    *breakdown.bucket_mut(rule.cost_type) += value;
                }
                CostFrequency::PerItem => {
                    *breakdown.bucket_mut(rule.cost_type) += value * total_units;
                }
                // Calendar cadences are period overheads; they belong to the
                // date-level allocation, not a single order
                _ => {}
            },
            CostCalculation::PerUnit => {
                *breakdown.bucket_mut(rule.cost_type) += value * total_units;
            }
        }
    }

    let total_cost = breakdown.total();
    let profit = order_revenue - total_cost;
    OrderAllocation {
        breakdown,
        revenue: order_revenue,
        total_cost,
        profit,
        profit_margin: percentage(profit, order_revenue),
    }
}

/// Date-level allocation across all of a date's orders. Coverage is scoped
/// to the calendar date: a variant override on one line does not suppress
/// the global rule for another, uncovered line's revenue on the same date.
pub fn allocate_date(
    date: NaiveDate,
    orders: &[&Order],
    line_items: &LineItemIndex,
    components: &ComponentIndex,
    rules: &[CostRule],
    mode: CalendarCostMode,
) -> CostBreakdown {
    let mut breakdown = CostBreakdown::default();
    let mut coverage = RevenueCoverage::default();

    let mut date_revenue = 0.0;
    let mut date_gross_sales = 0.0;
    let mut total_units = 0.0;
    for order in orders {
        date_revenue += safe_number(order.total_price);
        date_gross_sales += safe_number(order.gross_sales());
        total_units += order.total_quantity.max(0) as f64;
        apply_variant_overrides(
            order.created_at,
            line_items.for_order(&order.id),
            components,
            &mut breakdown,
            &mut coverage,
        );
    }
    let orders_count = orders.len() as f64;

    for rule in rules {
        if !rule.active_on(date) {
            continue;
        }
        let value = safe_number(rule.value);
        match rule.calculation {
            CostCalculation::Percentage => match rule.cost_type {
                CostType::Product => {
                    breakdown.cogs += value / 100.0 * coverage.uncovered_cogs(date_gross_sales);
                }
                CostType::Payment => {
                    breakdown.transaction_fees +=
                        value / 100.0 * coverage.uncovered_payment(date_revenue);
                    breakdown.transaction_fees += safe_number(rule.fixed_fee()) * orders_count;
                }
                other => {
                    *breakdown.bucket_mut(other) += value / 100.0 * date_revenue;
                }
            },
            CostCalculation::Fixed => match rule.frequency {
                CostFrequency::PerOrder => {
                    *breakdown.bucket_mut(rule.cost_type) += value * orders_count;
                }
                CostFrequency::PerItem => {
                    *breakdown.bucket_mut(rule.cost_type) += value * total_units;
                }
                cadence => {
                    if let CalendarCostMode::Prorated {
                        is_first_activity_date,
                    } = mode
                    {
                        *breakdown.bucket_mut(rule.cost_type) +=
                            daily_share(cadence, value, date, is_first_activity_date);
                    }
                }
            },
            CostCalculation::PerUnit => {
                *breakdown.bucket_mut(rule.cost_type) += value * total_units;
            }
        }
    }

    breakdown
}

/// Range-level allocation of calendar-cadence fixed rules: each rule's
/// value pro-rated time-bound over the overlap of its effective window and
/// the range. Used for range reporting instead of per-day pro-rating.
pub fn allocate_range_fixed(rules: &[CostRule], range: &DateRange) -> CostBreakdown {
    let mut breakdown = CostBreakdown::default();
    for rule in rules {
        if !rule.is_active || rule.calculation != CostCalculation::Fixed {
            continue;
        }
        if matches!(
            rule.frequency,
            CostFrequency::PerOrder | CostFrequency::PerItem
        ) {
            continue;
        }
        *breakdown.bucket_mut(rule.cost_type) += time_bound_share(
            safe_number(rule.value),
            rule.effective_from,
            rule.effective_to,
            range,
        );
    }
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a006_variant_cost::aggregate::VariantCostComponent;
    use contracts::domain::a007_cost_rule::aggregate::CostRuleConfig;

    // 2026-03-10T12:00:00Z
    const TS: i64 = 1_773_144_000_000;

    fn order(id: &str, total: f64, subtotal: f64, discounts: f64, units: i64) -> Order {
        Order {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            created_at: TS,
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

    fn line(id: &str, order_id: &str, variant_id: &str, qty: i64, unit_price: f64) -> OrderLineItem {
        OrderLineItem {
            id: id.to_string(),
            order_id: order_id.to_string(),
            variant_id: variant_id.to_string(),
            quantity: qty,
            unit_price,
            line_discount: 0.0,
        }
    }

    fn cogs_component(variant_id: &str, cogs: f64) -> VariantCostComponent {
        VariantCostComponent {
            id: format!("vc-{}", variant_id),
            organization_id: "org-1".to_string(),
            variant_id: variant_id.to_string(),
            cogs_per_unit: cogs,
            shipping_per_unit: 0.0,
            handling_per_unit: 0.0,
            payment_fee_percent: 0.0,
            payment_fixed_per_item: 0.0,
            effective_from: None,
            effective_to: None,
            is_active: true,
        }
    }

    fn rule(cost_type: CostType, calculation: CostCalculation, value: f64) -> CostRule {
        CostRule {
            id: format!("r-{:?}", cost_type),
            organization_id: "org-1".to_string(),
            name: format!("{:?} rule", cost_type),
            cost_type,
            calculation,
            frequency: CostFrequency::PerOrder,
            value,
            effective_from: None,
            effective_to: None,
            is_active: true,
            config: CostRuleConfig::None,
        }
    }

    #[test]
    fn test_override_excludes_covered_revenue_from_global_rule() {
        // Order revenue 100, discount 10, one line qty 2 with cogs_per_unit
        // 20 override and a 5% product rule active the same day: the line's
        // revenue is fully covered, so COGS is exactly the override's 40.
        let o = order("o-1", 100.0, 90.0, 10.0, 2);
        let items = vec![line("li-1", "o-1", "v-1", 2, 50.0)];
        let item_refs: Vec<&OrderLineItem> = items.iter().collect();
        let components = vec![cogs_component("v-1", 20.0)];
        let index = ComponentIndex::build(&components);
        let rules = vec![rule(CostType::Product, CostCalculation::Percentage, 5.0)];

        let allocation = allocate_order(&o, &item_refs, &index, &rules);
        assert_eq!(allocation.breakdown.cogs, 40.0);
        assert_eq!(allocation.total_cost, 40.0);
        assert_eq!(allocation.profit, 60.0);
        assert_eq!(allocation.profit_margin, 60.0);
    }

    #[test]
    fn test_global_rule_applies_to_uncovered_remainder() {
        // Two lines, only one variant has an override: the 10% product rule
        // charges the uncovered line's revenue only.
        let o = order("o-1", 200.0, 200.0, 0.0, 2);
        let items = vec![
            line("li-1", "o-1", "v-1", 1, 120.0),
            line("li-2", "o-1", "v-2", 1, 80.0),
        ];
        let item_refs: Vec<&OrderLineItem> = items.iter().collect();
        let components = vec![cogs_component("v-1", 30.0)];
        let index = ComponentIndex::build(&components);
        let rules = vec![rule(CostType::Product, CostCalculation::Percentage, 10.0)];

        let allocation = allocate_order(&o, &item_refs, &index, &rules);
        // 30 from the override + 10% of the uncovered 80
        assert_eq!(allocation.breakdown.cogs, 38.0);
    }

    #[test]
    fn test_payment_percentage_with_fixed_fee() {
        let o = order("o-1", 100.0, 100.0, 0.0, 1);
        let items: Vec<&OrderLineItem> = vec![];
        let index = ComponentIndex::build(&[]);
        let mut payment = rule(CostType::Payment, CostCalculation::Percentage, 2.9);
        payment.config = CostRuleConfig::FixedFee {
            fixed_fee: Some(0.30),
        };

        let allocation = allocate_order(&o, &items, &index, &[payment]);
        assert!((allocation.breakdown.transaction_fees - 3.20).abs() < 1e-9);
    }

    #[test]
    fn test_same_type_rules_stack_additively() {
        let o = order("o-1", 100.0, 100.0, 0.0, 1);
        let items: Vec<&OrderLineItem> = vec![];
        let index = ComponentIndex::build(&[]);
        let rules = vec![
            rule(CostType::Marketing, CostCalculation::Percentage, 3.0),
            rule(CostType::Marketing, CostCalculation::Percentage, 2.0),
        ];

        let allocation = allocate_order(&o, &items, &index, &rules);
        assert!((allocation.breakdown.marketing - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_and_per_unit_rules() {
        let o = order("o-1", 100.0, 100.0, 0.0, 4);
        let items: Vec<&OrderLineItem> = vec![];
        let index = ComponentIndex::build(&[]);
        let mut per_item = rule(CostType::Handling, CostCalculation::Fixed, 1.5);
        per_item.frequency = CostFrequency::PerItem;
        let rules = vec![
            rule(CostType::Operational, CostCalculation::Fixed, 2.0),
            per_item,
            rule(CostType::Shipping, CostCalculation::PerUnit, 0.5),
        ];

        let allocation = allocate_order(&o, &items, &index, &rules);
        assert_eq!(allocation.breakdown.operational, 2.0);
        assert_eq!(allocation.breakdown.handling, 6.0);
        assert_eq!(allocation.breakdown.shipping, 2.0);
    }

    #[test]
    fn test_zero_revenue_order_has_zero_margin() {
        let o = order("o-1", 0.0, 0.0, 0.0, 0);
        let items: Vec<&OrderLineItem> = vec![];
        let index = ComponentIndex::build(&[]);
        let rules = vec![rule(CostType::Operational, CostCalculation::Fixed, 5.0)];

        let allocation = allocate_order(&o, &items, &index, &rules);
        assert_eq!(allocation.profit, -5.0);
        assert_eq!(allocation.profit_margin, 0.0);
    }

    #[test]
    fn test_date_level_coverage_is_scoped_per_date() {
        // Covered order + uncovered order on the same date: the product
        // rule charges only the uncovered order's gross sales.
        let date: NaiveDate = "2026-03-10".parse().unwrap();
        let o1 = order("o-1", 100.0, 100.0, 0.0, 2);
        let o2 = order("o-2", 50.0, 50.0, 0.0, 1);
        let orders = vec![&o1, &o2];
        let items = vec![line("li-1", "o-1", "v-1", 2, 50.0)];
        let line_index = LineItemIndex::build(&items);
        let components = vec![cogs_component("v-1", 20.0)];
        let index = ComponentIndex::build(&components);
        let rules = vec![rule(CostType::Product, CostCalculation::Percentage, 10.0)];

        let breakdown = allocate_date(
            date,
            &orders,
            &line_index,
            &index,
            &rules,
            CalendarCostMode::Prorated {
                is_first_activity_date: true,
            },
        );
        // 40 override + 10% of the uncovered 50
        assert_eq!(breakdown.cogs, 45.0);
    }

    #[test]
    fn test_date_level_calendar_cadence_prorates() {
        let date: NaiveDate = "2026-01-15".parse().unwrap();
        let mut monthly = rule(CostType::Operational, CostCalculation::Fixed, 310.0);
        monthly.frequency = CostFrequency::Monthly;
        let line_index = LineItemIndex::build(&[]);
        let index = ComponentIndex::build(&[]);

        let breakdown = allocate_date(
            date,
            &[],
            &line_index,
            &index,
            &[monthly.clone()],
            CalendarCostMode::Prorated {
                is_first_activity_date: false,
            },
        );
        assert_eq!(breakdown.operational, 10.0);

        // Excluded mode leaves calendar cadences to the range-level path
        let excluded = allocate_date(
            date,
            &[],
            &line_index,
            &index,
            &[monthly],
            CalendarCostMode::Excluded,
        );
        assert_eq!(excluded.operational, 0.0);
    }

    #[test]
    fn test_range_fixed_allocation_is_time_bound() {
        let range = DateRange::parse("2026-01-01", "2026-01-31").unwrap();
        let mut monthly = rule(CostType::Operational, CostCalculation::Fixed, 100.0);
        monthly.frequency = CostFrequency::Monthly;
        let from = "2026-01-01"
            .parse::<NaiveDate>()
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let to = "2026-02-01"
            .parse::<NaiveDate>()
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        monthly.effective_from = Some(from);
        monthly.effective_to = Some(to);

        let breakdown = allocate_range_fixed(&[monthly], &range);
        assert!((breakdown.operational - 100.0).abs() < 1e-9);
    }
}
