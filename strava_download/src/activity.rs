
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use strava_client::StravaActivity;

use crate::DownloadError;

/// Strava reports distance as-is; the unit label is fixed.
pub const DISTANCE_UNIT: &str = "kilometres";

// fallback for start dates without an offset, read as UTC
const NAIVE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Movember only distinguishes walks from everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveType {
    Walk,
    Other,
}

impl MoveType {
    pub fn from_activity_type(activity_type: &str) -> MoveType {
        if activity_type == "Walk" {
            MoveType::Walk
        } else {
            MoveType::Other
        }
    }

    /// The `moveTypeId` Movember expects.
    pub fn id(self) -> u8 {
        match self {
            MoveType::Walk => 1,
            MoveType::Other => 2,
        }
    }
}

/// A Strava activity reduced to the fields a Movember move carries.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedActivity {
    pub distance: f64,
    pub distance_unit: &'static str,
    pub duration: u64,
    pub start_date: i64,
    pub move_type: MoveType,
}

impl NormalizedActivity {
    pub fn from_strava(activity: &StravaActivity) -> Result<NormalizedActivity, DownloadError> {
        Ok(NormalizedActivity {
            distance: activity.distance,
            distance_unit: DISTANCE_UNIT,
            duration: activity.moving_time,
            start_date: parse_start_date(&activity.start_date)?,
            move_type: MoveType::from_activity_type(&activity.activity_type),
        })
    }
}

/// Converts an ISO-8601 timestamp into seconds since the Unix epoch.
pub fn parse_start_date(value: &str) -> Result<i64, DownloadError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(date) => Ok(date.timestamp()),
        Err(e) => match NaiveDateTime::parse_from_str(value, NAIVE_DATE_FORMAT) {
            Ok(naive) => Ok(Utc.from_utc_datetime(&naive).timestamp()),
            Err(_) => Err(DownloadError::StartDate {
                value: String::from(value),
                source: e,
            }),
        },
    }
}
