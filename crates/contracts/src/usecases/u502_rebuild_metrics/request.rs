use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Request to recompute daily metrics for a set of dates.
///
/// Idempotent: re-running for the same dates overwrites the existing
/// records instead of double-adding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildRequest {
    pub organization_id: String,
    pub dates: Vec<NaiveDate>,
}
