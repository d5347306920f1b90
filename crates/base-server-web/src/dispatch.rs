//! Configured-route dispatch.
//!
//! Turns the `api_details.routes` section of the configuration into Axum
//! routes. Each registered route resolves its handler function once, at
//! startup; a request collects the query string and optional JSON body,
//! runs the handler on the blocking pool, records one event, and returns
//! the handler's status and body as JSON.
//!
//! Entries that cannot be served are skipped with a warning rather than
//! aborting startup. The rules live in [`base_server_core::resolve`] and
//! are shared with the self test.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter, on};
use base_server_core::{FunctionRequest, FunctionResponse, HttpMethod, ResolvedRoute};
use base_server_events::{NewEvent, is_success_status};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::state::AppState;

/// Resolve every configured route against the function registry.
///
/// Returns the accepted routes in configuration order; rejected entries
/// are logged and dropped.
pub fn resolve_routes(state: &AppState) -> Vec<ResolvedRoute> {
    let plan = base_server_core::resolve_routes(&state.config, &state.functions);
    for (name, reason) in &plan.rejected {
        warn!(route = %name, reason = %reason, "configured route not served, skipping");
    }
    for route in &plan.accepted {
        info!(method = %route.method, path = %route.path, function = %route.function, "registered API route");
    }
    plan.accepted
}

/// Add every accepted configured route to `router`.
pub fn register_routes(
    router: Router<Arc<AppState>>,
    routes: &[ResolvedRoute],
) -> Router<Arc<AppState>> {
    let mut by_path: BTreeMap<&str, MethodRouter<Arc<AppState>>> = BTreeMap::new();

    for route in routes {
        let binding = Arc::new(route.clone());
        let handler = move |State(state): State<Arc<AppState>>,
                            Query(query): Query<BTreeMap<String, String>>,
                            body: Bytes| {
            let binding = Arc::clone(&binding);
            async move { dispatch(state, binding, query, body).await }
        };
        let filter = method_filter(route.method);
        let method_router = match by_path.remove(route.path.as_str()) {
            Some(existing) => existing.on(filter, handler),
            None => on(filter, handler),
        };
        by_path.insert(route.path.as_str(), method_router);
    }

    by_path
        .into_iter()
        .fold(router, |router, (path, method_router)| router.route(path, method_router))
}

const fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Patch => MethodFilter::PATCH,
    }
}

// ---------------------------------------------------------------------------
// Per-request dispatch
// ---------------------------------------------------------------------------

async fn dispatch(
    state: Arc<AppState>,
    route: Arc<ResolvedRoute>,
    query: BTreeMap<String, String>,
    raw_body: Bytes,
) -> Response {
    let body = match parse_body(&raw_body) {
        Ok(body) => body,
        Err(message) => {
            let response = FunctionResponse::error(400, message);
            let input = event_input(&query, None);
            record(&state, &route, input, &response);
            return into_json(response);
        }
    };

    let input = event_input(&query, body.as_ref());
    let request = FunctionRequest {
        query,
        body,
        docs_root: state.config.storage.documentation_dir.clone(),
    };

    let task_state = Arc::clone(&state);
    let task_route = Arc::clone(&route);
    let task_input = input.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let response = (task_route.handler)(&request).unwrap_or_else(|e| {
            warn!(route = %task_route.path, error = %e, "handler function failed");
            FunctionResponse::error(500, e.to_string())
        });
        record(&task_state, &task_route, task_input, &response);
        response
    })
    .await;

    match joined {
        Ok(response) => into_json(response),
        Err(e) => {
            warn!(route = %route.path, error = %e, "handler task did not complete");
            let response = FunctionResponse::error(500, format!("handler task failed: {e}"));
            record(&state, &route, input, &response);
            into_json(response)
        }
    }
}

/// Parse the request body as JSON. An empty body is `None`.
fn parse_body(raw: &Bytes) -> Result<Option<Value>, String> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(raw)
        .map(Some)
        .map_err(|e| format!("Invalid JSON body: {e}"))
}

/// The event's `input`: a non-empty body, else the query parameters.
///
/// Object bodies are used as-is; any other non-null body is wrapped as
/// `{"body": value}`.
fn event_input(query: &BTreeMap<String, String>, body: Option<&Value>) -> Map<String, Value> {
    match body {
        Some(Value::Object(map)) if !map.is_empty() => return map.clone(),
        Some(Value::Object(_) | Value::Null) | None => {}
        Some(other) => {
            let mut wrapped = Map::new();
            wrapped.insert("body".to_owned(), other.clone());
            return wrapped;
        }
    }
    query
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

fn record(state: &AppState, route: &ResolvedRoute, input: Map<String, Value>, response: &FunctionResponse) {
    state.events.append(NewEvent {
        route: route.path.clone(),
        method: route.method.as_str().to_owned(),
        input,
        output: response.body.clone(),
        status: response.status,
        success: is_success_status(response.status),
    });
}

/// Convert a handler response into an HTTP JSON response.
pub(crate) fn into_json(response: FunctionResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(Value::Object(response.body))).into_response()
}
