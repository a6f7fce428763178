//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rate_limit::limit_requests;
use super::rest::{events, metrics};
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/api/health", get(health_check))
        // Ingestion
        .route("/api/events", post(events::create_event).get(events::list_events))
        .route("/api/events/batch", post(events::create_events))
        .route("/api/events/:id", get(events::get_event))
        // Aggregation
        .route("/api/metrics/summary", get(metrics::get_summary))
        .route("/api/metrics/timeseries", get(metrics::get_time_series))
        .route("/api/metrics/errors", get(metrics::get_top_errors))
        .route("/api/metrics/games", get(metrics::get_games))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            limit_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
