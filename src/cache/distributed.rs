//! Shared cache tier contract and an in-process implementation

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::sync::Cache;
use moka::Expiry;

use crate::error::InsightResult;

/// Cache shared between service instances
#[async_trait]
pub trait DistributedCache: Send + Sync {
    async fn get(&self, key: &str) -> InsightResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> InsightResult<()>;
}

#[derive(Clone)]
struct Entry {
    bytes: Vec<u8>,
    ttl: Duration,
}

/// Per-entry expiry taken from the `set` call
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// [`DistributedCache`] living in this process only.
///
/// Nothing is shared between processes; use it for single-instance runs and
/// tests. Deployments point `cache.redis_url` at a [`super::RedisCache`].
pub struct SharedMemoryCache {
    entries: Cache<String, Entry>,
}

impl SharedMemoryCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity.max(1))
                .expire_after(EntryTtl)
                .build(),
        }
    }
}

impl Default for SharedMemoryCache {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl DistributedCache for SharedMemoryCache {
    async fn get(&self, key: &str) -> InsightResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|e| e.bytes))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> InsightResult<()> {
        self.entries.insert(key.to_string(), Entry { bytes: value, ttl });
        Ok(())
    }
}
