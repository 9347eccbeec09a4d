use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of ad performance for one platform campaign scope.
///
/// Synced from the ad platform APIs; read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdInsight {
    pub id: String,
    pub organization_id: String,
    /// e.g. meta, google, tiktok
    pub platform: String,
    pub date: NaiveDate,

    pub spend: f64,
    #[serde(default)]
    pub impressions: i64,
    #[serde(default)]
    pub clicks: i64,
    /// Attributed conversions; platforms report fractional values
    #[serde(default)]
    pub conversions: f64,
    /// Attributed conversion value in store currency
    #[serde(default)]
    pub conversion_value: f64,
    #[serde(default)]
    pub reach: i64,
    #[serde(default)]
    pub video_views: i64,
    /// Seconds
    #[serde(default)]
    pub video_watch_time: f64,
}
