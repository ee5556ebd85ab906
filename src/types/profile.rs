//! Aggregate and persisted profile types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_zero, ActivityVector, Friend, Gift, User, WallPost};

/// Everything gathered for one analysis call. Never persisted as a row;
/// its JSON form becomes `Profile::raw_json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileData {
    pub user: User,
    pub wall: Vec<WallPost>,
    pub gifts: Vec<Gift>,
    pub friends: Vec<Friend>,
    pub vector: ActivityVector,
}

/// Stored analysis result, unique by `external_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Internal row id, assigned by the profile store on first save
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    pub external_id: i64,
    pub screen_name: String,
    pub full_name: String,
    pub raw_json: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Build an unsaved profile row for `data`
    pub fn from_data(
        external_id: i64,
        data: &ProfileData,
        raw_json: String,
        summary: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            external_id,
            screen_name: data.user.screen_name.clone(),
            full_name: data.user.full_name(),
            raw_json,
            summary,
            created_at: now,
            updated_at: now,
        }
    }
}
