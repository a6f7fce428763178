//! Event ingestion and listing endpoints

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::validation::{validate_batch, validate_event};
use super::{query_params, ApiError};
use crate::api::state::AppState;
use crate::ingest::EventQuery;
use crate::types::{Event, EventType, Severity};

/// Query parameters for listing events
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsParams {
    pub game_id: Option<String>,
    pub event_type: Option<EventType>,
    pub severity: Option<Severity>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of events to return (default: 100, max: 1000)
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// Response for POST /api/events/batch
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub inserted: usize,
    pub events: Vec<Event>,
}

fn body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(vec![rejection.body_text()]))
}

/// POST /api/events - Ingest a single event
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let value = body(payload)?;
    let input = validate_event(&value, "").map_err(ApiError::validation)?;

    let event = state.ingestion.create_event(input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// POST /api/events/batch - Ingest 1-100 events in one insert
pub async fn create_events(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let value = body(payload)?;
    let inputs = validate_batch(&value).map_err(ApiError::validation)?;

    let events = state.ingestion.create_events(inputs).await?;
    Ok((
        StatusCode::CREATED,
        Json(BatchResponse {
            inserted: events.len(),
            events,
        }),
    ))
}

/// GET /api/events - List events, newest first
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListEventsParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(params)?;
    let query = EventQuery {
        game_id: params.game_id,
        event_type: params.event_type,
        severity: params.severity,
        from: params.from,
        to: params.to,
        limit: params.limit,
        offset: Some(params.offset),
    };

    let page = state.ingestion.list_events(&query).await?;
    Ok(Json(page))
}

/// GET /api/events/:id - Get single event
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Ids are UUIDs; anything else cannot match
    let Ok(id) = Uuid::parse_str(&id) else {
        return Err(ApiError::not_found("Event not found"));
    };

    match state.ingestion.get_event(id).await? {
        Some(event) => Ok(Json(event)),
        None => Err(ApiError::not_found("Event not found")),
    }
}
