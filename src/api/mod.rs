//! HTTP API module
//!
//! - `GET /health` - Liveness check
//! - `GET /api/profiles/:external_id` - Stored profile
//! - `POST /api/profiles/:external_id/analyze` - Run the analysis pipeline

pub mod http;
pub mod profiles;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;

use crate::error::{ErrorKind, InsightError};

pub use http::{create_router, AppState};

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

/// Status and error code for a pipeline failure
pub fn status_for(err: &InsightError) -> (StatusCode, &'static str) {
    match err.kind() {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Permanent | ErrorKind::Decode => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        ErrorKind::Unavailable | ErrorKind::Transient => {
            (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE")
        }
        ErrorKind::Cancelled => (StatusCode::REQUEST_TIMEOUT, "CANCELLED"),
        ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for InsightError {
    fn into_response(self) -> Response {
        let (status, code) = status_for(&self);
        (status, Json(ApiError::new(code, self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (InsightError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (InsightError::permanent(5, "auth"), StatusCode::BAD_GATEWAY),
            (InsightError::Decode("x".into()), StatusCode::BAD_GATEWAY),
            (InsightError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (InsightError::Cancelled, StatusCode::REQUEST_TIMEOUT),
            (InsightError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err).0, expected, "{}", err);
        }
    }
}
