//! REST API module for HTTP endpoints
//!
//! Provides the ingestion and metrics endpoints:
//! - `POST /api/events` - Ingest one event
//! - `POST /api/events/batch` - Ingest 1-100 events
//! - `GET /api/events` - List events with filters and pagination
//! - `GET /api/events/:id` - Get single event
//! - `GET /api/metrics/summary|timeseries|errors|games` - Aggregations

pub mod events;
pub mod metrics;
pub mod validation;

use axum::{
    extract::{rejection::QueryRejection, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::TelemetryError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: message.into(),
            code: "NOT_FOUND".to_string(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
            code: "BAD_REQUEST".to_string(),
            details: None,
        }
    }

    pub fn validation(details: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Validation failed".to_string(),
            code: "VALIDATION_FAILED".to_string(),
            details: Some(details),
        }
    }

    pub fn too_many_requests() -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            error: "Too many requests, please try again later.".to_string(),
            code: "RATE_LIMITED".to_string(),
            details: None,
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Internal server error".to_string(),
            code: "INTERNAL_ERROR".to_string(),
            details: None,
        }
    }
}

impl From<TelemetryError> for ApiError {
    fn from(err: TelemetryError) -> Self {
        match err {
            TelemetryError::Validation(details) => ApiError::validation(details),
            other => {
                error!(error = %other, "Unhandled error");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Required `gameId` query parameter
pub(crate) fn require_game_id(game_id: Option<String>) -> Result<String, ApiError> {
    match game_id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ApiError::bad_request("gameId is required")),
    }
}

/// Unwrap query parameters, reporting parse failures as validation errors
pub(crate) fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::validation(vec![rejection.body_text()]))
}
