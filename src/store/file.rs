//! JSON-lines file-backed profile store
//!
//! Rows are held in memory and the whole table is rewritten atomically on
//! every save, one JSON object per line. The write runs on the blocking
//! pool while the table lock is held, so saves are applied in order. A save
//! that fails to reach disk leaves the in-memory table untouched.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{ProfileStore, ProfileTable};
use crate::error::{InsightError, InsightResult};
use crate::types::Profile;
use crate::utils::{atomic_write, cleanup_temp_files};

/// [`ProfileStore`] persisted to a `.jsonl` file
pub struct JsonlProfileStore {
    file_path: PathBuf,
    table: Mutex<ProfileTable>,
}

impl JsonlProfileStore {
    /// Open the store at `file_path`, loading existing rows if present
    pub fn open<P: AsRef<Path>>(file_path: P) -> InsightResult<Self> {
        let file_path = file_path.as_ref().to_path_buf();

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                let cleaned = cleanup_temp_files(parent)?;
                if cleaned > 0 {
                    info!(cleaned, dir = %parent.display(), "removed leftover temp files");
                }
            }
        }

        let table = ProfileTable::from_rows(Self::load_rows(&file_path)?);
        info!(path = %file_path.display(), rows = table.rows.len(), "profile store opened");

        Ok(Self {
            file_path,
            table: Mutex::new(table),
        })
    }

    fn load_rows(file_path: &Path) -> InsightResult<Vec<Profile>> {
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(file_path)?;
        let mut rows = Vec::new();

        for (n, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Profile>(line) {
                Ok(row) => rows.push(row),
                Err(e) => warn!(line = n + 1, error = %e, "skipping unreadable profile row"),
            }
        }

        Ok(rows)
    }

    fn render(table: &ProfileTable) -> InsightResult<String> {
        let mut rows: Vec<&Profile> = table.rows.values().collect();
        rows.sort_by_key(|p| p.id);

        let mut content = String::new();
        for row in rows {
            content.push_str(&serde_json::to_string(row)?);
            content.push('\n');
        }
        Ok(content)
    }

    async fn persist(&self, table: &ProfileTable) -> InsightResult<()> {
        let content = Self::render(table)?;
        let path = self.file_path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&path, content.as_bytes()))
            .await
            .map_err(|e| InsightError::Internal(format!("profile write task failed: {}", e)))??;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for JsonlProfileStore {
    async fn get_by_external_id(&self, external_id: i64) -> InsightResult<Option<Profile>> {
        Ok(self.table.lock().await.rows.get(&external_id).cloned())
    }

    async fn save(&self, profile: Profile) -> InsightResult<Profile> {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        let stored = next.upsert(profile);
        self.persist(&next).await?;
        *table = next;
        Ok(stored)
    }
}
