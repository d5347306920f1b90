//! Dashboard page and JSON handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Redirect to `/ui/` |
//! | `GET` | `/ui/` | Main dashboard |
//! | `GET` | `/ui/events` | Recent events page |
//! | `GET` | `/ui/api-docs` | API documentation page |
//! | `GET` | `/ui/bist` | Self-test page |
//! | `GET` | `/ui/docs` | Documentation browser |
//! | `GET` | `/ui/api/events` | Recent events as JSON |
//! | `GET` | `/ui/api/event-stats` | Event store failure counters |
//! | `GET` | `/ui/api/config` | The loaded configuration |
//! | `GET` | `/ui/api/server-source` | Source of the route dispatcher |
//! | `GET` | `/ui/api/bist-results` | Last saved self-test report |
//! | `POST` | `/ui/api/bist-run` | Run the self test now |
//! | `GET` | `/ui/api/documentation-folders` | Documentation folder listing |
//! | `GET` | `/ui/api/document` | One document's content |

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use base_server_bist::{load_report, run_bist};
use base_server_core::functions::documents;
use base_server_events::DEFAULT_QUERY_LIMIT;
use serde_json::{Value, json};

use crate::api::recent_events;
use crate::dispatch::into_json;
use crate::error::WebError;
use crate::state::AppState;
use crate::templates::Page;

/// Path the server-source endpoint reports.
const DISPATCH_SOURCE_PATH: &str = "crates/base-server-web/src/dispatch.rs";

/// Source text of the route dispatcher.
const DISPATCH_SOURCE: &str = include_str!("dispatch.rs");

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// `GET /`
pub async fn root() -> Redirect {
    Redirect::to("/ui/")
}

/// `GET /ui/`
///
/// # Errors
///
/// Returns [`WebError::Template`] if the page fails to render.
pub async fn main_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    let event_count = recent_events(&state, DEFAULT_QUERY_LIMIT).await?.len();
    render(&state, Page::Main, event_count)
}

/// `GET /ui/events`
///
/// # Errors
///
/// Returns [`WebError::Template`] if the page fails to render.
pub async fn events_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    render(&state, Page::Events, 0)
}

/// `GET /ui/api-docs`
///
/// # Errors
///
/// Returns [`WebError::Template`] if the page fails to render.
pub async fn api_docs_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    render(&state, Page::ApiDocs, 0)
}

/// `GET /ui/bist`
///
/// # Errors
///
/// Returns [`WebError::Template`] if the page fails to render.
pub async fn bist_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    render(&state, Page::Bist, 0)
}

/// `GET /ui/docs`
///
/// # Errors
///
/// Returns [`WebError::Template`] if the page fails to render.
pub async fn docs_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    render(&state, Page::Docs, 0)
}

fn render(state: &AppState, page: Page, event_count: usize) -> Result<Html<String>, WebError> {
    let config = &state.config;
    let routes: Vec<Value> = config
        .api_details
        .routes
        .iter()
        .map(|(name, route)| {
            json!({
                "name": name,
                "route": route.route,
                "method": route.method_name(),
                "function": route.function,
                "description": route.description,
            })
        })
        .collect();

    let context = json!({
        "title": page.title(),
        "active": page.nav_key(),
        "api_port": config.api_port(),
        "dashboard_port": config.dashboard_port(),
        "event_count": event_count,
        "stats": state.events.stats(),
        "routes": routes,
    });
    Ok(Html(state.pages.render(page, context)?))
}

// ---------------------------------------------------------------------------
// JSON endpoints
// ---------------------------------------------------------------------------

/// `GET /ui/api/events`
///
/// # Errors
///
/// Returns [`WebError::Internal`] if the store read task fails.
pub async fn events_json(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, WebError> {
    let events = recent_events(&state, DEFAULT_QUERY_LIMIT).await?;
    Ok(Json(json!({
        "success": true,
        "count": events.len(),
        "events": events,
    })))
}

/// `GET /ui/api/event-stats`
pub async fn event_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "stats": state.events.stats(),
    }))
}

/// `GET /ui/api/config`
pub async fn config_json(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "config": state.config.as_ref(),
    }))
}

/// `GET /ui/api/server-source`
pub async fn server_source() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "file": DISPATCH_SOURCE_PATH,
        "source": DISPATCH_SOURCE,
    }))
}

/// `GET /ui/api/bist-results`
///
/// # Errors
///
/// Returns [`WebError::NotFound`] when no report has been saved, or
/// [`WebError::Bist`] if the saved report cannot be read.
pub async fn bist_results(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, WebError> {
    let results_dir = state.config.storage.results_dir.clone();
    let report = tokio::task::spawn_blocking(move || load_report(&results_dir)).await??;
    let report = report.ok_or_else(|| WebError::NotFound("No BIST results found".to_owned()))?;
    Ok(Json(json!({
        "success": true,
        "results": report,
    })))
}

/// `POST /ui/api/bist-run`
///
/// # Errors
///
/// Returns [`WebError::Bist`] if the self test cannot run or its report
/// cannot be saved.
pub async fn bist_run(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, WebError> {
    let report = run_bist(&state.config).await?;
    Ok(Json(json!({
        "success": true,
        "results": report,
    })))
}

/// `GET /ui/api/documentation-folders`
///
/// # Errors
///
/// Returns [`WebError::Function`] on unexpected I/O failures.
pub async fn documentation_folders(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    let request = state.function_request();
    let response =
        tokio::task::spawn_blocking(move || documents::get_documentation_folders(&request)).await??;
    Ok(into_json(response))
}

/// `GET /ui/api/document`
///
/// # Errors
///
/// Returns [`WebError::Function`] on unexpected I/O failures.
pub async fn document(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Response, WebError> {
    let mut request = state.function_request();
    request.query = query;
    let response =
        tokio::task::spawn_blocking(move || documents::get_document_content(&request)).await??;
    Ok(into_json(response))
}
