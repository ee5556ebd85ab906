//! Social-graph API client
//!
//! Fetches users, walls, gifts and friends through a [`ResilientCaller`].
//! User lookups are cached in two tiers: the distributed cache is consulted
//! first, then the in-process cache, and only then the network. A network
//! hit populates both tiers.

pub mod protocol;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::{local_user_cache, DistributedCache, LocalUserCache, DEFAULT_LOCAL_CAPACITY};
use crate::config::SocialConfig;
use crate::error::{InsightError, InsightResult};
use crate::resilience::{RequestContext, ResilientCaller};
use crate::types::{Friend, Gift, User, WallPost};

use protocol::{
    decode_envelope, ItemList, RawFriend, RawGift, RawUser, RawWallPost, FRIEND_FIELDS,
    USER_FIELDS,
};

/// Read-only access to a user's social profile
#[async_trait]
pub trait SocialClient: Send + Sync {
    async fn get_user(&self, ctx: &RequestContext, id: i64) -> InsightResult<User>;

    async fn get_wall(
        &self,
        ctx: &RequestContext,
        id: i64,
        offset: u32,
        count: u32,
    ) -> InsightResult<Vec<WallPost>>;

    async fn get_gifts(
        &self,
        ctx: &RequestContext,
        id: i64,
        offset: u32,
        count: u32,
    ) -> InsightResult<Vec<Gift>>;

    async fn get_friends(
        &self,
        ctx: &RequestContext,
        id: i64,
        offset: u32,
        count: u32,
    ) -> InsightResult<Vec<Friend>>;
}

/// Cache key for a user record in the distributed tier
pub fn user_cache_key(id: i64) -> String {
    format!("user:{}", id)
}

/// HTTP implementation of [`SocialClient`]
pub struct SocialApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    api_version: String,
    caller: ResilientCaller,
    local: LocalUserCache,
    shared: Option<Arc<dyn DistributedCache>>,
    user_ttl: Duration,
}

impl SocialApiClient {
    /// Create a client with a non-expiring local cache of 10 000 users and no
    /// distributed tier
    pub fn new(http: reqwest::Client, config: &SocialConfig, caller: ResilientCaller) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            api_version: config.api_version.clone(),
            caller,
            local: local_user_cache(DEFAULT_LOCAL_CAPACITY, None),
            shared: None,
            user_ttl: Duration::from_secs(600),
        }
    }

    /// Replace the in-process tier
    pub fn with_local_cache(mut self, local: LocalUserCache) -> Self {
        self.local = local;
        self
    }

    /// Enable the distributed tier; user entries expire after `ttl`
    pub fn with_distributed_cache(mut self, cache: Arc<dyn DistributedCache>, ttl: Duration) -> Self {
        self.shared = Some(cache);
        self.user_ttl = ttl;
        self
    }

    pub fn caller(&self) -> &ResilientCaller {
        &self.caller
    }

    /// Call `{base_url}/{method}` and decode the envelope payload
    async fn call_method<T>(
        &self,
        ctx: &RequestContext,
        method: &str,
        mut params: Vec<(&'static str, String)>,
    ) -> InsightResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        params.push(("access_token", self.access_token.clone()));
        params.push(("v", self.api_version.clone()));

        self.caller
            .call(ctx, || {
                let request = self.http.get(&url).query(&params);
                async move {
                    let response = request.send().await?;
                    let status = response.status();
                    let body = response.text().await?;
                    if !status.is_success() {
                        return Err(InsightError::from_status(status.as_u16(), &body));
                    }
                    decode_envelope(&body)
                }
            })
            .await
    }

    async fn cached_user(&self, key: &str) -> Option<User> {
        let shared = self.shared.as_ref()?;
        match shared.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<User>(&bytes) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(key, error = %e, "discarding undecodable cached user");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "distributed cache read failed");
                None
            }
        }
    }

    async fn store_user(&self, key: &str, user: &User) {
        let Some(shared) = self.shared.as_ref() else {
            return;
        };
        let bytes = match serde_json::to_vec(user) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "failed to encode user for cache");
                return;
            }
        };
        if let Err(e) = shared.set(key, bytes, self.user_ttl).await {
            warn!(key, error = %e, "distributed cache write failed");
        }
    }
}

fn page_params(id_param: &'static str, id: i64, offset: u32, count: u32) -> Vec<(&'static str, String)> {
    vec![
        (id_param, id.to_string()),
        ("offset", offset.to_string()),
        ("count", count.to_string()),
    ]
}

#[async_trait]
impl SocialClient for SocialApiClient {
    async fn get_user(&self, ctx: &RequestContext, id: i64) -> InsightResult<User> {
        let key = user_cache_key(id);

        if let Some(user) = self.cached_user(&key).await {
            debug!(user_id = id, "user served from distributed cache");
            return Ok(user);
        }

        if let Some(user) = self.local.get(&id) {
            debug!(user_id = id, "user served from local cache");
            return Ok(user);
        }

        let users: Vec<RawUser> = self
            .call_method(
                ctx,
                "users.get",
                vec![("user_ids", id.to_string()), ("fields", USER_FIELDS.to_string())],
            )
            .await?;

        let user: User = users
            .into_iter()
            .next()
            .map(User::from)
            .ok_or_else(|| InsightError::NotFound(format!("user {} not found", id)))?;

        self.local.insert(id, user.clone());
        self.store_user(&key, &user).await;

        Ok(user)
    }

    async fn get_wall(
        &self,
        ctx: &RequestContext,
        id: i64,
        offset: u32,
        count: u32,
    ) -> InsightResult<Vec<WallPost>> {
        let list: ItemList<RawWallPost> = self
            .call_method(ctx, "wall.get", page_params("owner_id", id, offset, count))
            .await?;
        Ok(list.items.into_iter().map(WallPost::from).collect())
    }

    async fn get_gifts(
        &self,
        ctx: &RequestContext,
        id: i64,
        offset: u32,
        count: u32,
    ) -> InsightResult<Vec<Gift>> {
        let list: ItemList<RawGift> = self
            .call_method(ctx, "gifts.get", page_params("user_id", id, offset, count))
            .await?;
        Ok(list.items.into_iter().map(Gift::from).collect())
    }

    async fn get_friends(
        &self,
        ctx: &RequestContext,
        id: i64,
        offset: u32,
        count: u32,
    ) -> InsightResult<Vec<Friend>> {
        let mut params = page_params("user_id", id, offset, count);
        params.push(("fields", FRIEND_FIELDS.to_string()));

        let list: ItemList<RawFriend> = self.call_method(ctx, "friends.get", params).await?;
        Ok(list.items.into_iter().map(Friend::from).collect())
    }
}
