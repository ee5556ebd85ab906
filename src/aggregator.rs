//! Profile analysis orchestration
//!
//! `analyze` runs the pipeline for one external user:
//!
//! ```text
//! user ──► wall ┐
//!          gifts├─► activity vector ─► summary ─► save ─► snapshot
//!          friends┘                                 (required) (best effort)
//! ```
//!
//! Any failure before the save aborts with nothing written. The three list
//! fetches run concurrently and the first error drops the others.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::analyzer;
use crate::error::InsightResult;
use crate::resilience::RequestContext;
use crate::social::SocialClient;
use crate::store::{ProfileStore, SnapshotStore};
use crate::summary::SummaryGenerator;
use crate::types::{Profile, ProfileData};

/// Page window used for every list fetch
pub const PAGE_OFFSET: u32 = 0;
pub const PAGE_COUNT: u32 = 100;

/// Ties the upstream clients and stores together
#[derive(Clone)]
pub struct ProfileAggregator {
    social: Arc<dyn SocialClient>,
    summarizer: Arc<dyn SummaryGenerator>,
    profiles: Arc<dyn ProfileStore>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
}

impl ProfileAggregator {
    pub fn new(
        social: Arc<dyn SocialClient>,
        summarizer: Arc<dyn SummaryGenerator>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            social,
            summarizer,
            profiles,
            snapshots: None,
        }
    }

    /// Archive raw aggregates after each successful save
    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Fetch, analyze, summarize and persist the profile of `external_id`
    #[instrument(skip(self, ctx))]
    pub async fn analyze(&self, ctx: &RequestContext, external_id: i64) -> InsightResult<Profile> {
        let data = self.collect(ctx, external_id).await?;

        let summary = self.summarizer.generate(ctx, &data).await?;

        let raw_json = serde_json::to_string(&data)?;
        let profile = Profile::from_data(external_id, &data, raw_json, summary, Utc::now());

        let stored = self.profiles.save(profile).await?;
        info!(external_id, profile_id = stored.id, "profile saved");

        if let Some(snapshots) = &self.snapshots {
            if let Err(e) = snapshots.save_snapshot(external_id, stored.raw_json.as_bytes()).await {
                warn!(external_id, error = %e, "snapshot write failed");
            }
        }

        Ok(stored)
    }

    /// Stored profile for `external_id`, if any
    pub async fn get_profile(
        &self,
        _ctx: &RequestContext,
        external_id: i64,
    ) -> InsightResult<Option<Profile>> {
        self.profiles.get_by_external_id(external_id).await
    }

    async fn collect(&self, ctx: &RequestContext, external_id: i64) -> InsightResult<ProfileData> {
        let user = self.social.get_user(ctx, external_id).await?;

        let (wall, gifts, friends) = futures::try_join!(
            self.social.get_wall(ctx, external_id, PAGE_OFFSET, PAGE_COUNT),
            self.social.get_gifts(ctx, external_id, PAGE_OFFSET, PAGE_COUNT),
            self.social.get_friends(ctx, external_id, PAGE_OFFSET, PAGE_COUNT),
        )?;

        let vector = analyzer::compute(&wall, &gifts, &friends);
        info!(
            external_id,
            posts = wall.len(),
            gifts = gifts.len(),
            friends = friends.len(),
            posts_per_month = vector.posts_per_month,
            "profile data collected"
        );

        Ok(ProfileData {
            user,
            wall,
            gifts,
            friends,
            vector,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::error::InsightError;
    use crate::store::{InMemoryProfileStore, InMemorySnapshotStore};
    use crate::types::{Friend, Gift, User, WallPost};

    #[derive(Default)]
    struct FakeSocial {
        fail_gifts: bool,
        missing_user: bool,
    }

    #[async_trait]
    impl SocialClient for FakeSocial {
        async fn get_user(&self, _ctx: &RequestContext, id: i64) -> InsightResult<User> {
            if self.missing_user {
                return Err(InsightError::NotFound(format!("user {} not found", id)));
            }
            Ok(User {
                id,
                screen_name: "durov".to_string(),
                first_name: "Pavel".to_string(),
                last_name: "Durov".to_string(),
                ..User::default()
            })
        }

        async fn get_wall(
            &self,
            _ctx: &RequestContext,
            _id: i64,
            offset: u32,
            count: u32,
        ) -> InsightResult<Vec<WallPost>> {
            assert_eq!((offset, count), (0, 100));
            Ok(vec![
                WallPost::new(1, Utc.timestamp_opt(0, 0).unwrap(), "hello"),
                WallPost::new(2, Utc.timestamp_opt(86_400, 0).unwrap(), "world"),
            ])
        }

        async fn get_gifts(
            &self,
            _ctx: &RequestContext,
            _id: i64,
            _offset: u32,
            _count: u32,
        ) -> InsightResult<Vec<Gift>> {
            if self.fail_gifts {
                return Err(InsightError::Unavailable("circuit open".to_string()));
            }
            Ok(vec![Gift {
                id: 1,
                text: String::new(),
            }])
        }

        async fn get_friends(
            &self,
            _ctx: &RequestContext,
            _id: i64,
            _offset: u32,
            _count: u32,
        ) -> InsightResult<Vec<Friend>> {
            Ok(Vec::new())
        }
    }

    struct FakeSummary {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeSummary {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SummaryGenerator for FakeSummary {
        async fn generate(&self, _ctx: &RequestContext, data: &ProfileData) -> InsightResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(InsightError::Unavailable("retries exhausted".to_string()));
            }
            Ok(format!("summary {} of {}", n, data.user.first_name))
        }
    }

    struct FailingSnapshots;

    #[async_trait]
    impl SnapshotStore for FailingSnapshots {
        async fn save_snapshot(&self, _external_id: i64, _raw: &[u8]) -> InsightResult<()> {
            Err(InsightError::Internal("bucket unreachable".to_string()))
        }
    }

    fn aggregator(
        social: FakeSocial,
        summary: Arc<FakeSummary>,
        store: Arc<InMemoryProfileStore>,
    ) -> ProfileAggregator {
        ProfileAggregator::new(Arc::new(social), summary, store)
    }

    #[tokio::test]
    async fn test_analyze_persists_and_snapshots() {
        let store = Arc::new(InMemoryProfileStore::new());
        let snapshots = Arc::new(InMemorySnapshotStore::new());
        let agg = aggregator(FakeSocial::default(), Arc::new(FakeSummary::new(false)), store.clone())
            .with_snapshots(snapshots.clone());

        let profile = agg.analyze(&RequestContext::new(), 1).await.unwrap();
        assert_eq!(profile.id, 1);
        assert_eq!(profile.screen_name, "durov");
        assert_eq!(profile.full_name, "Pavel Durov");
        assert_eq!(profile.summary, "summary 1 of Pavel");

        let data: ProfileData = serde_json::from_str(&profile.raw_json).unwrap();
        assert_eq!(data.vector.posts_per_month, 2.0);
        assert_eq!(data.vector.gifts_count, 1);

        let obj = snapshots.get("profiles/1.json").unwrap();
        assert_eq!(obj.bytes, profile.raw_json.as_bytes());
    }

    #[tokio::test]
    async fn test_summary_failure_writes_nothing() {
        let store = Arc::new(InMemoryProfileStore::new());
        let snapshots = Arc::new(InMemorySnapshotStore::new());
        let agg = aggregator(FakeSocial::default(), Arc::new(FakeSummary::new(true)), store.clone())
            .with_snapshots(snapshots.clone());

        let res = agg.analyze(&RequestContext::new(), 1).await;
        assert!(matches!(res, Err(InsightError::Unavailable(_))));
        assert!(store.is_empty());
        assert!(snapshots.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_swallowed() {
        let store = Arc::new(InMemoryProfileStore::new());
        let agg = aggregator(FakeSocial::default(), Arc::new(FakeSummary::new(false)), store.clone())
            .with_snapshots(Arc::new(FailingSnapshots));

        let profile = agg.analyze(&RequestContext::new(), 5).await.unwrap();
        let stored = agg.get_profile(&RequestContext::new(), 5).await.unwrap().unwrap();
        assert_eq!(stored, profile);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_before_summary() {
        let store = Arc::new(InMemoryProfileStore::new());
        let summary = Arc::new(FakeSummary::new(false));
        let social = FakeSocial {
            fail_gifts: true,
            ..FakeSocial::default()
        };
        let agg = aggregator(social, summary.clone(), store.clone());

        let res = agg.analyze(&RequestContext::new(), 1).await;
        assert!(matches!(res, Err(InsightError::Unavailable(_))));
        assert_eq!(summary.calls.load(Ordering::SeqCst), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let store = Arc::new(InMemoryProfileStore::new());
        let social = FakeSocial {
            missing_user: true,
            ..FakeSocial::default()
        };
        let agg = aggregator(social, Arc::new(FakeSummary::new(false)), store.clone());

        let res = agg.analyze(&RequestContext::new(), 404).await;
        assert!(matches!(res, Err(InsightError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_reanalysis_overwrites_single_row() {
        let store = Arc::new(InMemoryProfileStore::new());
        let agg = aggregator(FakeSocial::default(), Arc::new(FakeSummary::new(false)), store.clone());
        let ctx = RequestContext::new();

        let first = agg.analyze(&ctx, 1).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = agg.analyze(&ctx, 1).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.summary, "summary 2 of Pavel");
    }

    #[tokio::test]
    async fn test_get_profile_absent_is_none() {
        let agg = aggregator(
            FakeSocial::default(),
            Arc::new(FakeSummary::new(false)),
            Arc::new(InMemoryProfileStore::new()),
        );
        assert!(agg.get_profile(&RequestContext::new(), 9).await.unwrap().is_none());
    }
}
