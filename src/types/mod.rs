//! Data types for the profile insight pipeline
//!
//! Upstream records, derived metrics, the in-memory aggregate and the
//! persisted profile row.

mod activity;
mod profile;
mod social;

pub use activity::ActivityVector;
pub use profile::{Profile, ProfileData};
pub use social::{Friend, Gift, User, WallPost};

/// Check if value is zero (for skip_serializing_if)
pub fn is_zero(val: &i64) -> bool {
    *val == 0
}
