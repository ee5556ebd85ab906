//! Snapshot stores

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::SnapshotStore;
use crate::error::{InsightError, InsightResult};
use crate::utils::atomic_write;

/// Content type of every snapshot object
pub const SNAPSHOT_CONTENT_TYPE: &str = "application/json";

/// Object key for the snapshot of `external_id`
pub fn snapshot_key(external_id: i64) -> String {
    format!("profiles/{}.json", external_id)
}

/// Writes snapshots under a root directory using the object key as the
/// relative path
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
}

impl FsSnapshotStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// File path of the snapshot for `external_id`
    pub fn path_for(&self, external_id: i64) -> PathBuf {
        self.root.join(snapshot_key(external_id))
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn save_snapshot(&self, external_id: i64, raw: &[u8]) -> InsightResult<()> {
        let path = self.path_for(external_id);
        let bytes = raw.to_vec();
        tokio::task::spawn_blocking(move || atomic_write(&path, &bytes))
            .await
            .map_err(|e| InsightError::Internal(format!("snapshot task failed: {}", e)))??;
        Ok(())
    }
}

/// Stored snapshot object
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Keeps snapshots in memory, keyed like the object store
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    objects: Mutex<HashMap<String, SnapshotObject>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<SnapshotObject> {
        self.objects.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save_snapshot(&self, external_id: i64, raw: &[u8]) -> InsightResult<()> {
        self.objects.lock().insert(
            snapshot_key(external_id),
            SnapshotObject {
                content_type: SNAPSHOT_CONTENT_TYPE.to_string(),
                bytes: raw.to_vec(),
            },
        );
        Ok(())
    }
}
