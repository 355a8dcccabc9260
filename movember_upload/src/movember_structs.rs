
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use strava_download::NormalizedActivity;

const MEMBER: &str = "member";
// Movember requires some content on a feed post; moves carry no text.
const MOVE_CONTENT: &str = "\n";

#[derive(Serialize)]
pub(crate) struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    // seen both as a string and as a number
    #[serde(default)]
    pub member_id: Option<Value>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MoveData {
    pub distance: f64,
    pub distance_unit: &'static str,
    pub duration: u64,
    #[serde(rename = "moveDate")]
    pub move_date: i64,
    #[serde(rename = "moveTypeId")]
    pub move_type_id: u8,
}

/// Body of a `POST /v18/newsfeed/` call announcing one move on the
/// member's own feed.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsfeedPost<'a> {
    pub author_id: &'a str,
    pub author_type: &'static str,
    pub content: &'static str,
    pub entity_id: &'a str,
    pub entity_type: &'static str,
    pub move_data: MoveData,
}

impl<'a> NewsfeedPost<'a> {
    pub fn new(member_id: &'a str, activity: &NormalizedActivity) -> NewsfeedPost<'a> {
        NewsfeedPost {
            author_id: member_id,
            author_type: MEMBER,
            content: MOVE_CONTENT,
            entity_id: member_id,
            entity_type: MEMBER,
            move_data: MoveData {
                distance: activity.distance,
                distance_unit: activity.distance_unit,
                duration: activity.duration,
                move_date: activity.start_date,
                move_type_id: activity.move_type.id(),
            },
        }
    }
}
