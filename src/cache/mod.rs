//! Cache tiers for user lookups
//!
//! - `DistributedCache`: shared across processes (Redis), entries expire (10 min for users)
//! - `LocalUserCache`: in-process, bounded, optional expiry

mod distributed;
mod local;
mod redis_cache;

pub use distributed::{DistributedCache, SharedMemoryCache};
pub use local::{local_user_cache, LocalUserCache, DEFAULT_LOCAL_CAPACITY};
pub use redis_cache::RedisCache;
