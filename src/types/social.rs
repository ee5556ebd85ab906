//! Records fetched from the social-graph API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External profile identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct User {
    pub id: i64,
    pub screen_name: String,
    pub first_name: String,
    pub last_name: String,
    pub sex: i32,
    pub birth_date: String,
    pub city: String,
    pub about: String,
}

impl User {
    /// First and last name joined by a single space
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Timeline entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallPost {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub text: String,
    pub likes: i64,
    pub reposts: i64,
    pub comments: i64,
    pub views: i64,
    pub post_type: String,
    pub is_pinned: bool,
}

impl WallPost {
    /// A post with zero engagement, mostly useful for tests and fixtures
    pub fn new(id: i64, date: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            id,
            date,
            text: text.into(),
            likes: 0,
            reposts: 0,
            comments: 0,
            views: 0,
            post_type: "post".to_string(),
            is_pinned: false,
        }
    }

    /// Likes + comments + reposts
    pub fn engagement(&self) -> i64 {
        self.likes
            .saturating_add(self.comments)
            .saturating_add(self.reposts)
    }
}

/// Received gift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    pub id: i64,
    pub text: String,
}

/// Social edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub sex: i32,
}
