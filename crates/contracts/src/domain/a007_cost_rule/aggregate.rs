use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cost bucket an org-level rule charges into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostType {
    Product,
    Shipping,
    Handling,
    Payment,
    Marketing,
    Operational,
    Tax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCalculation {
    Percentage,
    Fixed,
    PerUnit,
}

/// Charge cadence. Meaningful only for `CostCalculation::Fixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostFrequency {
    #[default]
    PerOrder,
    PerItem,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    OneTime,
}

/// Typed replacement for the loosely-shaped rule config blob: one variant
/// per rule family that actually carries extra knobs, validated at
/// deserialization by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostRuleConfig {
    #[default]
    None,
    /// Payment rules: optional fixed fee charged once per order on top of
    /// the percentage.
    FixedFee {
        #[serde(default)]
        fixed_fee: Option<f64>,
    },
}

/// Org-level cost rule, the fallback tier below variant cost components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRule {
    pub id: String,
    pub organization_id: String,
    pub name: String,

    #[serde(rename = "type")]
    pub cost_type: CostType,
    pub calculation: CostCalculation,
    #[serde(default)]
    pub frequency: CostFrequency,

    /// Percent for percentage rules, amount otherwise
    pub value: f64,

    /// Epoch milliseconds UTC; None = open bound
    #[serde(default)]
    pub effective_from: Option<i64>,
    #[serde(default)]
    pub effective_to: Option<i64>,

    pub is_active: bool,

    #[serde(default)]
    pub config: CostRuleConfig,
}

impl CostRule {
    /// Whether the rule is active at `ts` (epoch ms). Malformed windows
    /// (`effective_to < effective_from`) are always inactive.
    pub fn active_at(&self, ts: i64) -> bool {
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

    /// Whether the rule's window overlaps any instant of the given UTC date.
    pub fn active_on(&self, date: NaiveDate) -> bool {
        let day_start = date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc()
            .timestamp_millis();
        let day_end = day_start + 86_400_000 - 1;

        if !self.is_active {
            return false;
        }
        if let (Some(from), Some(to)) = (self.effective_from, self.effective_to) {
            if to < from {
                return false;
            }
        }
        if let Some(from) = self.effective_from {
            if from > day_end {
                return false;
            }
        }
        if let Some(to) = self.effective_to {
            if to < day_start {
                return false;
            }
        }
        true
    }

    /// Fixed per-order fee configured alongside a payment percentage rule.
    pub fn fixed_fee(&self) -> f64 {
        match &self.config {
            CostRuleConfig::FixedFee { fixed_fee } => fixed_fee.unwrap_or(0.0),
            CostRuleConfig::None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(from: Option<i64>, to: Option<i64>) -> CostRule {
        CostRule {
            id: "r-1".into(),
            organization_id: "org-1".into(),
            name: "product cost".into(),
            cost_type: CostType::Product,
            calculation: CostCalculation::Percentage,
            frequency: CostFrequency::PerOrder,
            value: 5.0,
            effective_from: from,
            effective_to: to,
            is_active: true,
            config: CostRuleConfig::None,
        }
    }

    #[test]
    fn test_active_on_window_overlap() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis();

        // Window covering a single hour of the date still counts
        let r = rule(Some(day_start + 3_600_000), Some(day_start + 7_200_000));
        assert!(r.active_on(date));

        // Window ending the millisecond before the date does not
        let r = rule(None, Some(day_start - 1));
        assert!(!r.active_on(date));
    }

    #[test]
    fn test_malformed_window_inactive() {
        let r = rule(Some(200), Some(100));
        assert!(!r.active_at(150));
        assert!(!r.active_on(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()));
    }

    #[test]
    fn test_fixed_fee_config() {
        let mut r = rule(None, None);
        assert_eq!(r.fixed_fee(), 0.0);
        r.config = CostRuleConfig::FixedFee {
            fixed_fee: Some(0.30),
        };
        assert_eq!(r.fixed_fee(), 0.30);
    }

    #[test]
    fn test_config_wire_format() {
        let json = r#"{"kind":"fixed_fee","fixed_fee":0.3}"#;
        let config: CostRuleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            CostRuleConfig::FixedFee {
                fixed_fee: Some(0.3)
            }
        );
    }
}
