//! In-memory profile store

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ProfileStore, ProfileTable};
use crate::error::InsightResult;
use crate::types::Profile;

/// Process-local [`ProfileStore`]
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    table: Mutex<ProfileTable>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.table.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_by_external_id(&self, external_id: i64) -> InsightResult<Option<Profile>> {
        Ok(self.table.lock().rows.get(&external_id).cloned())
    }

    async fn save(&self, profile: Profile) -> InsightResult<Profile> {
        Ok(self.table.lock().upsert(profile))
    }
}
