//! Persistence contracts and implementations
//!
//! - [`ProfileStore`]: required, upsert keyed by external user id
//! - [`SnapshotStore`]: best-effort archival of the raw aggregate JSON

mod file;
mod memory;
mod snapshot;

use async_trait::async_trait;

use crate::error::InsightResult;
use crate::types::Profile;

pub use file::JsonlProfileStore;
pub use memory::InMemoryProfileStore;
pub use snapshot::{
    snapshot_key, FsSnapshotStore, InMemorySnapshotStore, SnapshotObject, SNAPSHOT_CONTENT_TYPE,
};

/// Durable store of analysis results
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Stored profile for `external_id`; absence is not an error
    async fn get_by_external_id(&self, external_id: i64) -> InsightResult<Option<Profile>>;

    /// Insert or overwrite the row sharing `profile.external_id`.
    ///
    /// Returns the stored row: the internal id and creation time of an
    /// existing row are kept, everything else is replaced.
    async fn save(&self, profile: Profile) -> InsightResult<Profile>;
}

/// Archive for raw aggregate snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save_snapshot(&self, external_id: i64, raw: &[u8]) -> InsightResult<()>;
}

/// Rows keyed by external id plus the next internal id to hand out
#[derive(Debug, Clone, Default)]
pub(crate) struct ProfileTable {
    pub rows: std::collections::HashMap<i64, Profile>,
    pub next_id: i64,
}

impl ProfileTable {
    pub fn from_rows(rows: impl IntoIterator<Item = Profile>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.next_id = table.next_id.max(row.id);
            table.rows.insert(row.external_id, row);
        }
        table
    }

    /// Apply upsert semantics and return the row as stored
    pub fn upsert(&mut self, mut profile: Profile) -> Profile {
        match self.rows.get(&profile.external_id) {
            Some(existing) => {
                profile.id = existing.id;
                profile.created_at = existing.created_at;
            }
            None => {
                self.next_id += 1;
                profile.id = self.next_id;
            }
        }
        self.rows.insert(profile.external_id, profile.clone());
        profile
    }
}
