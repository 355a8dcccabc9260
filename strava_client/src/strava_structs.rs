
use serde_derive::Deserialize;

/// One entry of the athlete activity list. Strava returns far more
/// fields than this; everything else is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StravaActivity {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    pub distance: f64,
    pub moving_time: u64,
    pub start_date: String,
    #[serde(rename = "type")]
    pub activity_type: String,
}
