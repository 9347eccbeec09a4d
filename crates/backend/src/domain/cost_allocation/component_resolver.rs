use contracts::domain::a006_variant_cost::aggregate::VariantCostComponent;
use std::collections::HashMap;

/// Variant cost components indexed by variant id, scoped to one run.
pub struct ComponentIndex<'a> {
    by_variant: HashMap<&'a str, Vec<&'a VariantCostComponent>>,
}

impl<'a> ComponentIndex<'a> {
    pub fn build(components: &'a [VariantCostComponent]) -> Self {
        let mut by_variant: HashMap<&str, Vec<&VariantCostComponent>> = HashMap::new();
        for component in components {
            by_variant
                .entry(component.variant_id.as_str())
                .or_default()
                .push(component);
        }
        Self { by_variant }
    }

    /// Most recent applicable override for a variant at an order timestamp:
    /// among components whose window contains `ts`, the one with the latest
    /// `effective_from` wins; an open `effective_from` counts as the oldest.
    pub fn resolve(&self, variant_id: &str, ts: i64) -> Option<&'a VariantCostComponent> {
        self.by_variant
            .get(variant_id)?
            .iter()
            .filter(|c| c.applies_at(ts))
            .max_by_key(|c| c.effective_from.unwrap_or(i64::MIN))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: &str, from: Option<i64>, cogs: f64) -> VariantCostComponent {
        VariantCostComponent {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            variant_id: "v-1".to_string(),
            cogs_per_unit: cogs,
            shipping_per_unit: 0.0,
            handling_per_unit: 0.0,
            payment_fee_percent: 0.0,
            payment_fixed_per_item: 0.0,
            effective_from: from,
            effective_to: None,
            is_active: true,
        }
    }

    #[test]
    fn test_latest_effective_from_wins() {
        let components = vec![
            component("old", Some(100), 10.0),
            component("new", Some(500), 12.0),
            component("open", None, 8.0),
        ];
        let index = ComponentIndex::build(&components);

        // All three apply at ts=600; the most recent override wins
        assert_eq!(index.resolve("v-1", 600).unwrap().id, "new");
        // At ts=200 the newer one is not yet effective
        assert_eq!(index.resolve("v-1", 200).unwrap().id, "old");
        // Before any bounded window starts, the open one remains
        assert_eq!(index.resolve("v-1", 50).unwrap().id, "open");
    }

    #[test]
    fn test_unknown_variant_resolves_to_none() {
        let components = vec![component("c", None, 10.0)];
        let index = ComponentIndex::build(&components);
        assert!(index.resolve("v-2", 600).is_none());
    }

    #[test]
    fn test_inactive_components_are_passed_over() {
        let mut inactive = component("off", Some(500), 12.0);
        inactive.is_active = false;
        let components = vec![component("on", Some(100), 10.0), inactive];
        let index = ComponentIndex::build(&components);
        assert_eq!(index.resolve("v-1", 600).unwrap().id, "on");
    }
}
