//! Wire format of the social-graph API
//!
//! Every method answers with an envelope holding either `response` or
//! `error{error_code, error_msg}`. Payload records use nested count objects
//! (`likes.count`) and nested references (`city.title`) that are flattened
//! into the crate's own types here.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{InsightError, InsightResult};
use crate::types::{Friend, Gift, User, WallPost};

/// Profile fields requested on user lookup
pub const USER_FIELDS: &str = "bdate,city,about,sex,screen_name";

/// Profile fields requested on friends lookup
pub const FRIEND_FIELDS: &str = "sex";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

/// Unwrap an envelope body into its typed payload
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> InsightResult<T> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| InsightError::Decode(format!("invalid envelope: {}", e)))?;

    if let Some(err) = envelope.error {
        if err.error_code != 0 || !err.error_msg.is_empty() {
            return Err(InsightError::permanent(err.error_code, err.error_msg));
        }
    }

    let payload = envelope
        .response
        .ok_or_else(|| InsightError::Decode("envelope has no response".to_string()))?;

    serde_json::from_value(payload)
        .map_err(|e| InsightError::Decode(format!("unexpected payload: {}", e)))
}

/// Paginated list payload
#[derive(Debug, Deserialize)]
pub struct ItemList<T> {
    #[serde(default)]
    pub count: i64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct Counter {
    #[serde(default)]
    count: i64,
}

#[derive(Debug, Default, Deserialize)]
struct CityRef {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
pub struct RawUser {
    id: i64,
    #[serde(default)]
    screen_name: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    sex: i32,
    #[serde(default)]
    bdate: String,
    #[serde(default)]
    city: Option<CityRef>,
    #[serde(default)]
    about: String,
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        User {
            id: raw.id,
            screen_name: raw.screen_name,
            first_name: raw.first_name,
            last_name: raw.last_name,
            sex: raw.sex,
            birth_date: raw.bdate,
            city: raw.city.map(|c| c.title).unwrap_or_default(),
            about: raw.about,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawWallPost {
    id: i64,
    #[serde(default)]
    date: i64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    likes: Counter,
    #[serde(default)]
    reposts: Counter,
    #[serde(default)]
    comments: Counter,
    #[serde(default)]
    views: Counter,
    #[serde(default)]
    post_type: String,
    #[serde(default)]
    is_pinned: i32,
}

impl From<RawWallPost> for WallPost {
    fn from(raw: RawWallPost) -> Self {
        WallPost {
            id: raw.id,
            date: unix_to_utc(raw.date),
            text: raw.text,
            likes: raw.likes.count,
            reposts: raw.reposts.count,
            comments: raw.comments.count,
            views: raw.views.count,
            post_type: raw.post_type,
            is_pinned: raw.is_pinned == 1,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawGift {
    id: i64,
    #[serde(default)]
    text: String,
}

impl From<RawGift> for Gift {
    fn from(raw: RawGift) -> Self {
        Gift {
            id: raw.id,
            text: raw.text,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawFriend {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    sex: i32,
}

impl From<RawFriend> for Friend {
    fn from(raw: RawFriend) -> Self {
        Friend {
            id: raw.id,
            first_name: raw.first_name,
            last_name: raw.last_name,
            sex: raw.sex,
        }
    }
}

fn unix_to_utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}
