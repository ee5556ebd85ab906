//! Profile endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use super::{AppState, ApiError};
use crate::resilience::RequestContext;

fn parse_external_id(raw: &str) -> Result<i64, Response> {
    raw.parse::<i64>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request(format!("invalid external id: {}", raw))),
        )
            .into_response()
    })
}

/// GET /api/profiles/:external_id - Stored profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Response {
    let external_id = match parse_external_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let ctx = state.request_context();
    match state.aggregator.get_profile(&ctx, external_id).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!(
                "profile '{}' not found",
                external_id
            ))),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/profiles/:external_id/analyze - Fetch, analyze and store
pub async fn analyze_profile(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Response {
    let external_id = match parse_external_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let ctx: RequestContext = state.request_context();
    match state.aggregator.analyze(&ctx, external_id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => {
            warn!(external_id, error = %e, "analysis failed");
            e.into_response()
        }
    }
}
