use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of one rebuild run. A date that fails in isolation is counted as
/// skipped and does not abort the rest of the run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RebuildSummary {
    /// Dates attempted
    pub processed: u32,
    /// Dates whose metric record was written
    pub updated: u32,
    /// Dates that failed and were passed over
    pub skipped: u32,
    #[serde(default)]
    pub skipped_dates: Vec<NaiveDate>,
}
