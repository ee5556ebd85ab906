//! Derived engagement metrics

use serde::{Deserialize, Serialize};

/// Engagement metrics computed from one wall/gifts/friends sample.
///
/// All fields are non-negative. `profile_completeness` is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivityVector {
    pub posts_per_month: f64,
    pub average_post_len: f64,
    pub engagement_rate: f64,
    pub gifts_count: usize,
    pub friends_count: usize,
    pub profile_completeness: f64,
}
