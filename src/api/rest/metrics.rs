//! Metrics endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{query_params, require_game_id, ApiError};
use crate::api::state::AppState;
use crate::metrics::{DEFAULT_ERROR_LIMIT, DEFAULT_HOURS, MAX_HOURS};
use crate::types::{Interval, Metric, TimeSeriesPoint, TopError};

/// Query parameters for GET /api/metrics/summary
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub game_id: Option<String>,
    #[serde(default = "default_hours")]
    pub hours: i64,
}

/// Query parameters for GET /api/metrics/timeseries
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesParams {
    pub game_id: Option<String>,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub interval: Interval,
    #[serde(default = "default_hours")]
    pub hours: i64,
}

/// Query parameters for GET /api/metrics/errors
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorsParams {
    pub game_id: Option<String>,
    #[serde(default = "default_error_limit")]
    pub limit: usize,
}

fn default_hours() -> i64 {
    DEFAULT_HOURS
}

fn default_error_limit() -> usize {
    DEFAULT_ERROR_LIMIT
}

fn check_hours(hours: i64) -> Result<i64, ApiError> {
    if (1..=MAX_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(ApiError::bad_request(format!(
            "hours must be between 1 and {}",
            MAX_HOURS
        )))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesResponse {
    pub game_id: String,
    pub metric: Metric,
    pub interval: Interval,
    pub data: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorsResponse {
    pub game_id: String,
    pub errors: Vec<TopError>,
}

#[derive(Debug, Serialize)]
pub struct GamesResponse {
    pub games: Vec<String>,
}

/// GET /api/metrics/summary?gameId=xxx&hours=24
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(params)?;
    let game_id = require_game_id(params.game_id)?;
    let hours = check_hours(params.hours)?;

    let summary = state.metrics.get_summary(&game_id, hours).await?;
    Ok(Json(summary))
}

/// GET /api/metrics/timeseries?gameId=xxx&metric=crashes&interval=hour&hours=24
pub async fn get_time_series(
    State(state): State<Arc<AppState>>,
    params: Result<Query<TimeSeriesParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(params)?;
    let game_id = require_game_id(params.game_id)?;
    let hours = check_hours(params.hours)?;

    let data = state
        .metrics
        .get_time_series(&game_id, params.metric, params.interval, hours)
        .await?;

    Ok(Json(TimeSeriesResponse {
        game_id,
        metric: params.metric,
        interval: params.interval,
        data,
    }))
}

/// GET /api/metrics/errors?gameId=xxx&limit=10
pub async fn get_top_errors(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ErrorsParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(params)?;
    let game_id = require_game_id(params.game_id)?;

    let errors = state.metrics.get_top_errors(&game_id, params.limit).await?;
    Ok(Json(ErrorsResponse { game_id, errors }))
}

/// GET /api/metrics/games - List all games with data
pub async fn get_games(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let games = state.metrics.get_games_list().await?;
    Ok(Json(GamesResponse { games }))
}
