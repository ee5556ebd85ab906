//! HTTP server setup with Axum

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use super::profiles;
use crate::aggregator::ProfileAggregator;
use crate::resilience::RequestContext;

/// Shared handler state
pub struct AppState {
    pub aggregator: ProfileAggregator,
    /// Deadline applied to every request context
    pub request_timeout: Duration,
    /// Cancelled on server shutdown; aborts in-flight analyses
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(aggregator: ProfileAggregator, request_timeout: Duration) -> Self {
        Self {
            aggregator,
            request_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Tie request contexts to an externally owned shutdown token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Fresh context carrying the request deadline, cancelled on shutdown
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_token(self.shutdown.clone()).child(Some(self.request_timeout))
    }
}

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/profiles/:external_id", get(profiles::get_profile))
        .route(
            "/api/profiles/:external_id/analyze",
            post(profiles::analyze_profile),
        )
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
