//! In-process user cache tier
//!
//! Backed by `moka::sync::Cache`: bounded by entry count (eviction chosen by
//! moka's TinyLFU policy once the bound is reached) with an optional
//! time-to-live. Reads and writes are lock-free for callers.

use std::time::Duration;

use moka::sync::Cache;

use crate::types::User;

/// Users keyed by external id
pub type LocalUserCache = Cache<i64, User>;

/// Default bound on cached users
pub const DEFAULT_LOCAL_CAPACITY: u64 = 10_000;

/// Build the local tier holding at most `capacity` users; `ttl` of `None`
/// keeps entries until evicted by size
pub fn local_user_cache(capacity: u64, ttl: Option<Duration>) -> LocalUserCache {
    let builder = Cache::builder().max_capacity(capacity.max(1));
    match ttl {
        Some(ttl) => builder.time_to_live(ttl).build(),
        None => builder.build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> User {
        User {
            id,
            first_name: format!("user{}", id),
            ..User::default()
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = local_user_cache(16, None);
        cache.insert(1, user(1));
        assert_eq!(cache.get(&1).unwrap().first_name, "user1");
        assert!(cache.get(&2).is_none());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = local_user_cache(10, None);
        for id in 0..100 {
            cache.insert(id, user(id));
        }
        cache.run_pending_tasks();
        assert!(cache.entry_count() <= 10);
    }

    #[test]
    fn test_entries_expire() {
        let cache = local_user_cache(16, Some(Duration::from_millis(50)));
        cache.insert(1, user(1));
        assert!(cache.get(&1).is_some());

        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get(&1).is_none());
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = local_user_cache(1_000, None);
        std::thread::scope(|s| {
            for t in 0..4i64 {
                let cache = cache.clone();
                s.spawn(move || {
                    for i in 0..100 {
                        let id = t * 100 + i;
                        cache.insert(id, user(id));
                    }
                });
            }
        });
        for id in 0..400 {
            assert_eq!(cache.get(&id).unwrap().id, id);
        }
    }
}
