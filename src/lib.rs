//! Profile Insight Service
//!
//! Fetches a user's profile, wall, gifts and friends from a social-graph
//! API, derives engagement metrics, asks a language service for a short
//! summary, and stores the result keyed by the external user id.
//!
//! # Features
//!
//! - **Resilient upstream calls**: circuit breaker around bounded linear-backoff retry
//! - **Two-tier user cache**: distributed TTL tier over a bounded in-process tier
//! - **Fail-fast aggregation**: nothing is persisted unless every fetch and the summary succeed
//! - **Upsert persistence**: one row per external id, re-analysis overwrites in place
//! - **Best-effort snapshots**: raw aggregate JSON archived under `profiles/{id}.json`
//!
//! # Modules
//!
//! - `resilience`: Circuit breaker, retry driver, request contexts, clocks
//! - `cache`: Local and distributed cache tiers
//! - `social`: Social-graph API client and wire format
//! - `analyzer`: Activity vector computation
//! - `summary`: Prompt building and language-service client
//! - `store`: Profile and snapshot stores
//! - `aggregator`: The analysis pipeline
//! - `api`: Axum HTTP surface
//! - `config`: TOML + environment configuration
//! - `utils`: Atomic file writes
//!
//! # Example
//!
//! ```no_run
//! use profile_insight::{ProfileAggregator, RequestContext};
//! # async fn demo(agg: ProfileAggregator) -> profile_insight::InsightResult<()> {
//! let ctx = RequestContext::new();
//! let profile = agg.analyze(&ctx, 1).await?;
//! println!("{}: {}", profile.full_name, profile.summary);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod resilience;
pub mod social;
pub mod store;
pub mod summary;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use aggregator::ProfileAggregator;
pub use config::AppConfig;
pub use error::{ErrorKind, InsightError, InsightResult};
pub use resilience::{CircuitBreaker, CircuitState, RequestContext, ResilientCaller};
pub use social::{SocialApiClient, SocialClient};
pub use store::{ProfileStore, SnapshotStore};
pub use summary::{LanguageServiceClient, SummaryGenerator};
pub use types::{ActivityVector, Friend, Gift, Profile, ProfileData, User, WallPost};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
