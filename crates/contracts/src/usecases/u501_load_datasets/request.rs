use crate::shared::date_range::DateRange;
use serde::{Deserialize, Serialize};

/// Independently-paged dataset families the loader can fetch.
///
/// `Orders` is the primary track: each orders page also carries the child
/// line items, transactions, refunds and fulfillments plus the referenced
/// customers, products, variants and variant cost components. The remaining
/// keys are supplemental tracks, each paged by its own cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKey {
    Orders,
    AdInsights,
    GlobalCosts,
    SessionAnalytics,
    ShopAnalytics,
}

impl DatasetKey {
    pub const ALL: [DatasetKey; 5] = [
        DatasetKey::Orders,
        DatasetKey::AdInsights,
        DatasetKey::GlobalCosts,
        DatasetKey::SessionAnalytics,
        DatasetKey::ShopAnalytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKey::Orders => "orders",
            DatasetKey::AdInsights => "ad_insights",
            DatasetKey::GlobalCosts => "global_costs",
            DatasetKey::SessionAnalytics => "session_analytics",
            DatasetKey::ShopAnalytics => "shop_analytics",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoadLimits {
    /// Truncate the primary track after this many orders
    #[serde(default)]
    pub max_orders: Option<usize>,
}

/// Request for one loader run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub organization_id: String,
    pub date_range: DateRange,
    /// Allow-list of datasets to fetch; None = all
    #[serde(default)]
    pub datasets: Option<Vec<DatasetKey>>,
    #[serde(default)]
    pub limits: LoadLimits,
}

impl LoadRequest {
    pub fn all(organization_id: &str, date_range: DateRange) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            date_range,
            datasets: None,
            limits: LoadLimits::default(),
        }
    }

    /// Whether the given dataset is inside the allow-list.
    pub fn wants(&self, key: DatasetKey) -> bool {
        match &self.datasets {
            None => true,
            Some(list) => list.contains(&key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list() {
        let range = DateRange::parse("2026-01-01", "2026-01-31").unwrap();
        let mut request = LoadRequest::all("org-1", range);
        assert!(request.wants(DatasetKey::Orders));
        assert!(request.wants(DatasetKey::ShopAnalytics));

        request.datasets = Some(vec![DatasetKey::Orders, DatasetKey::AdInsights]);
        assert!(request.wants(DatasetKey::AdInsights));
        assert!(!request.wants(DatasetKey::GlobalCosts));
    }
}
