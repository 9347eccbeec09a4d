use crate::projections::p900_daily_metrics::dto::MetricTotals;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Week,
    Month,
}

/// Weekly or monthly rollup of daily metrics.
///
/// Keyed by (organization, period_type, period_key); week keys are ISO-8601
/// ("2026-W05"), month keys are "YYYY-MM". Additive fields are resummed from
/// the day level on every rollup run and derived ratios recomputed from the
/// sums, so the record is always overwritten, never incremented.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetric {
    pub organization_id: String,
    pub period_type: PeriodType,
    pub period_key: String,
    /// Number of dates that contributed data
    pub days_included: i64,
    /// The contributing dates, sorted
    pub dates: Vec<NaiveDate>,
    #[serde(flatten)]
    pub totals: MetricTotals,
}
