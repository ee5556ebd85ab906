//! Redis-backed shared cache tier

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

use super::DistributedCache;
use crate::error::{InsightError, InsightResult};

/// [`DistributedCache`] on a Redis server. Values are stored with `SET .. EX`.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// Connect to `url` (`redis://host:port/db`)
    pub async fn connect(url: &str) -> InsightResult<Self> {
        let client = Client::open(url)
            .map_err(|e| InsightError::Internal(format!("invalid redis url: {}", e)))?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

/// Whole seconds for `EX`, never zero
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl DistributedCache for RedisCache {
    async fn get(&self, key: &str) -> InsightResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> InsightResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<&str, Vec<u8>, ()>(key, value, expiry_secs(ttl)).await?;
        Ok(())
    }
}
