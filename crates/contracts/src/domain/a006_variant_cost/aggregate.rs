use serde::{Deserialize, Serialize};

/// Merchant-configured cost override for one variant.
///
/// Several components may exist per variant with different effective
/// windows; the applicable one at an order's timestamp is the component with
/// the latest `effective_from` among those whose window contains the
/// timestamp (open bounds allowed).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantCostComponent {
    pub id: String,
    pub organization_id: String,
    pub variant_id: String,

    #[serde(default)]
    pub cogs_per_unit: f64,
    #[serde(default)]
    pub shipping_per_unit: f64,
    #[serde(default)]
    pub handling_per_unit: f64,
    /// Percent of line revenue, e.g. 2.9 for 2.9%
    #[serde(default)]
    pub payment_fee_percent: f64,
    #[serde(default)]
    pub payment_fixed_per_item: f64,

    /// Epoch milliseconds UTC; None = open bound
    #[serde(default)]
    pub effective_from: Option<i64>,
    #[serde(default)]
    pub effective_to: Option<i64>,

    pub is_active: bool,
}

impl VariantCostComponent {
    /// Whether the component is applicable at `ts` (epoch ms).
    ///
    /// A window with `effective_to < effective_from` is malformed and is
    /// treated as always inactive rather than an error.
    pub fn applies_at(&self, ts: i64) -> bool {
        if !self.is_active {
            return false;
        }
        if let (Some(from), Some(to)) = (self.effective_from, self.effective_to) {
            if to < from {
                return false;
            }
        }
        if let Some(from) = self.effective_from {
            if ts < from {
                return false;
            }
        }
        if let Some(to) = self.effective_to {
            if ts > to {
                return false;
            }
        }
        true
    }
}
