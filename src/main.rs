//! Profile Insight Service - Binary Entry Point
//!
//! Usage: `profile-server [config.toml]`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use profile_insight::api::{create_router, AppState};
use profile_insight::cache::{local_user_cache, RedisCache};
use profile_insight::config::AppConfig;
use profile_insight::store::{FsSnapshotStore, JsonlProfileStore};
use profile_insight::{
    LanguageServiceClient, ProfileAggregator, ResilientCaller, SocialApiClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().collect();
    if let Some(arg) = args.get(1) {
        if arg == "--version" || arg == "-V" {
            println!("{} {}", profile_insight::NAME, profile_insight::VERSION);
            return Ok(());
        }
    }
    let config_path = args.get(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    let resilience = &config.resilience;

    let social_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.social.timeout_secs))
        .build()?;
    let social_caller = ResilientCaller::new(
        "social_api",
        resilience.breaker_config(),
        resilience.retry_policy(),
        Duration::from_secs(config.social.timeout_secs),
    );
    let mut social = SocialApiClient::new(social_http, &config.social, social_caller)
        .with_local_cache(local_user_cache(
            config.cache.local_capacity,
            config.cache.local_ttl(),
        ));
    match config.cache.redis_url() {
        Some(url) => match RedisCache::connect(url).await {
            Ok(cache) => {
                info!("distributed user cache enabled");
                social = social.with_distributed_cache(Arc::new(cache), config.cache.user_ttl());
            }
            Err(e) => warn!(error = %e, "redis unavailable, using local user cache only"),
        },
        None => info!("cache.redis_url not set, using local user cache only"),
    }

    let language_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.language.timeout_secs))
        .build()?;
    let language_caller = ResilientCaller::new(
        "language_service",
        resilience.breaker_config(),
        resilience.retry_policy(),
        Duration::from_secs(config.language.timeout_secs),
    );
    let summarizer = LanguageServiceClient::new(language_http, &config.language, language_caller);

    let profiles = JsonlProfileStore::open(&config.storage.profile_store)?;

    let mut aggregator =
        ProfileAggregator::new(Arc::new(social), Arc::new(summarizer), Arc::new(profiles));
    if !config.storage.snapshot_dir.is_empty() {
        aggregator = aggregator.with_snapshots(Arc::new(FsSnapshotStore::new(&config.storage.snapshot_dir)));
    } else {
        info!("snapshot directory not configured, snapshots disabled");
    }

    let shutdown = CancellationToken::new();
    let state = Arc::new(
        AppState::new(aggregator, Duration::from_secs(config.http.request_timeout_secs))
            .with_shutdown(shutdown.clone()),
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.http.addr).await?;
    info!(addr = %config.http.addr, version = profile_insight::VERSION, "profile server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("profile server stopped");
    Ok(())
}

/// Wait for Ctrl-C, then cancel in-flight analyses
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
    shutdown.cancel();
}
