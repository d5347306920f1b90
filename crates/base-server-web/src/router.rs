//! Axum router construction for the API and dashboard servers.
//!
//! Both routers share one [`AppState`], answer unknown paths with the
//! JSON 404 envelope, and trace every request.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::dispatch::{register_routes, resolve_routes};
use crate::error::WebError;
use crate::state::AppState;
use crate::{api, dashboard};

/// Build the API server router.
///
/// The router includes every configured route that resolves (see
/// [`crate::dispatch`]) plus the built-ins:
/// - `GET /health`
/// - `GET /events`
/// - `GET /api/get_last_100_api_calls`
/// - `GET /api/documentation`
/// - `GET /get_all_routes`
///
/// CORS allows any origin, method, and header so dashboard pages served
/// from the other port can call it.
pub fn build_api_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let configured = resolve_routes(&state);
    tracing::info!(
        configured = configured.len(),
        declared = state.config.api_details.routes.len(),
        "API routes resolved"
    );

    let router = Router::new()
        .route("/health", get(api::health))
        .route("/events", get(api::list_events))
        .route("/api/get_last_100_api_calls", get(api::last_100_api_calls))
        .route("/api/documentation", get(api::documentation))
        .route("/get_all_routes", get(api::documentation));

    register_routes(router, &configured)
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the dashboard server router.
pub fn build_dashboard_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard::root))
        .route("/ui", get(dashboard::root))
        // Pages
        .route("/ui/", get(dashboard::main_page))
        .route("/ui/events", get(dashboard::events_page))
        .route("/ui/api-docs", get(dashboard::api_docs_page))
        .route("/ui/bist", get(dashboard::bist_page))
        .route("/ui/docs", get(dashboard::docs_page))
        // JSON
        .route("/ui/api/events", get(dashboard::events_json))
        .route("/ui/api/event-stats", get(dashboard::event_stats))
        .route("/ui/api/config", get(dashboard::config_json))
        .route("/ui/api/server-source", get(dashboard::server_source))
        .route("/ui/api/bist-results", get(dashboard::bist_results))
        .route("/ui/api/bist-run", post(dashboard::bist_run))
        .route(
            "/ui/api/documentation-folders",
            get(dashboard::documentation_folders),
        )
        .route("/ui/api/document", get(dashboard::document))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> WebError {
    WebError::NotFound("Not found".to_owned())
}
