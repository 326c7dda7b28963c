use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::cache::{CacheRead, MatchCache};
use crate::error::CacheError;
use crate::models::Match;

#[derive(Clone)]
pub struct AppState {
    pub cache: MatchCache,
}

/// Build the Axum router for the match API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/cricket-matches",
            get(read_handler).put(refresh_handler).post(manual_set_handler),
        )
        .route("/api/cricket-matches/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// JSON error body: `{error, message, timestamp}`.
pub struct ApiError(CacheError);

impl From<CacheError> for ApiError {
    fn from(e: CacheError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            CacheError::BadInput(_) => StatusCode::BAD_REQUEST,
            CacheError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
            "timestamp": Utc::now(),
        });
        (status, Json(body)).into_response()
    }
}

fn freshness_headers(read: &CacheRead) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-cache-status", HeaderValue::from_static(read.status.as_str()));
    headers.insert("x-cache-age", HeaderValue::from(read.age.as_secs()));
    headers.insert("x-cache-remaining", HeaderValue::from(read.remaining.as_secs()));
    headers.insert("x-cache-count", HeaderValue::from(read.count()));
    headers
}

/// GET /api/cricket-matches
async fn read_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    match state.cache.read().await {
        Ok(read) => Ok((freshness_headers(&read), Json(read.data))),
        Err(e) => {
            error!("No match data available: {}", e);
            Err(e.into())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    message: &'static str,
    status: &'static str,
    old_count: usize,
    new_count: usize,
    /// Seconds; absent when nothing was cached
    old_cache_age: Option<u64>,
    timestamp: DateTime<Utc>,
    data: Arc<Vec<Match>>,
}

/// PUT /api/cricket-matches
async fn refresh_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.cache.force_refresh().await?;
    Ok(Json(RefreshResponse {
        message: "Cache refreshed",
        status: summary.status.as_str(),
        old_count: summary.old_count,
        new_count: summary.new_count,
        old_cache_age: summary.old_age.map(|a| a.as_secs()),
        timestamp: summary.timestamp,
        data: summary.data,
    }))
}

/// POST /api/cricket-matches
async fn manual_set_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let raw: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!("Manual override body is not JSON: {}", e);
        CacheError::BadInput(format!("request body is not valid JSON: {}", e))
    })?;
    let summary = state.cache.manual_set(&raw).await?;
    Ok(Json(json!({
        "message": "Cache updated manually",
        "count": summary.count,
        "timestamp": summary.timestamp,
    })))
}

/// GET /api/cricket-matches/status
async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.cache.info().await)
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
