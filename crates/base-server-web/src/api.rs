//! Built-in API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness |
//! | `GET` | `/events` | Recent events, `?limit=` (default 100, max 1000) |
//! | `GET` | `/api/get_last_100_api_calls` | The 100 most recent events |
//! | `GET` | `/api/documentation` | Documentation for every route |
//! | `GET` | `/get_all_routes` | Same document as `/api/documentation` |
//!
//! Built-in routes are not recorded in the event log.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use base_server_events::{ApiEvent, DEFAULT_QUERY_LIMIT};
use serde_json::json;

use crate::documentation::build_documentation;
use crate::error::WebError;
use crate::state::AppState;

/// Upper bound on `?limit=` for `/events`.
pub const MAX_EVENTS_LIMIT: usize = 1_000;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /events` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Maximum number of events to return, as sent by the client.
    pub limit: Option<String>,
}

impl EventsQuery {
    /// The effective limit: default 100, negatives clamp to 0, capped at
    /// [`MAX_EVENTS_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`WebError::BadRequest`] if `limit` is not an integer.
    pub fn effective_limit(&self) -> Result<usize, WebError> {
        let Some(raw) = self.limit.as_deref() else {
            return Ok(DEFAULT_QUERY_LIMIT);
        };
        let requested: i64 = raw
            .trim()
            .parse()
            .map_err(|e| WebError::BadRequest(format!("invalid limit: {raw}: {e}")))?;
        let clamped = usize::try_from(requested.max(0)).unwrap_or(MAX_EVENTS_LIMIT);
        Ok(clamped.min(MAX_EVENTS_LIMIT))
    }
}

/// Read recent events off the async runtime.
///
/// # Errors
///
/// Returns [`WebError::Internal`] if the blocking task fails.
pub async fn recent_events(state: &Arc<AppState>, limit: usize) -> Result<Vec<ApiEvent>, WebError> {
    let events = Arc::clone(&state.events);
    Ok(tokio::task::spawn_blocking(move || events.query_recent(limit)).await?)
}

fn events_body(events: &[ApiEvent]) -> serde_json::Value {
    json!({
        "success": true,
        "events": events,
        "count": events.len(),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "status": "healthy",
        "message": "API server is running",
    }))
}

/// `GET /events`
///
/// # Errors
///
/// Returns [`WebError::BadRequest`] for a non-integer `limit`.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, WebError> {
    let limit = params.effective_limit()?;
    let events = recent_events(&state, limit).await?;
    Ok(Json(events_body(&events)))
}

/// `GET /api/get_last_100_api_calls`
///
/// # Errors
///
/// Returns [`WebError::Internal`] if the store read task fails.
pub async fn last_100_api_calls(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, WebError> {
    let events = recent_events(&state, DEFAULT_QUERY_LIMIT).await?;
    Ok(Json(events_body(&events)))
}

/// `GET /api/documentation` and `GET /get_all_routes`
pub async fn documentation(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(build_documentation(&state.config))
}
