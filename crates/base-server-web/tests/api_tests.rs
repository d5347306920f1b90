//! Integration tests for the API server.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base_server_core::AppConfig;
use base_server_events::EventStore;
use base_server_web::router::build_api_router;
use base_server_web::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

const CONFIG: &str = r#"{
    "api_details": {"routes": {
        "health": {
            "route": "/api/health", "method": "GET", "function": "health_check",
            "function_file_relative_path": "functions/health.rs",
            "input": [], "expected_output": [{"success": {"type": "bool"}}]
        },
        "get_agent_file": {
            "route": "/api/get_agent_file", "method": "GET", "function": "get_agent_file",
            "function_file_relative_path": "functions/agents.rs"
        },
        "post_agent_file": {
            "route": "/api/get_agent_file", "method": "POST", "function": "get_agent_file",
            "function_file_relative_path": "functions/agents.rs"
        },
        "folders": {
            "route": "/api/get_documentation_folders", "function": "get_documentation_folders",
            "function_file_relative_path": "functions/documents.rs"
        },
        "incomplete": {"route": "/api/incomplete", "function": "health_check"},
        "unknown_function": {
            "route": "/api/unknown", "method": "GET", "function": "does_not_exist",
            "function_file_relative_path": "functions/nowhere.rs"
        },
        "bad_method": {
            "route": "/api/trace", "method": "TRACE", "function": "health_check",
            "function_file_relative_path": "functions/health.rs"
        },
        "shadows_builtin": {
            "route": "/health", "method": "POST", "function": "health_check",
            "function_file_relative_path": "functions/health.rs"
        },
        "zz_duplicate": {
            "route": "/api/health", "method": "GET", "function": "get_documents",
            "function_file_relative_path": "functions/documents.rs"
        }
    }}
}"#;

struct Harness {
    router: Router,
    events: Arc<EventStore>,
    _docs: tempfile::TempDir,
}

fn harness() -> Harness {
    let docs = tempfile::tempdir().unwrap();
    let agent_dir = docs.path().join("agents").join("code_quality_agent");
    fs::create_dir_all(&agent_dir).unwrap();
    fs::write(agent_dir.join("agent.md"), "You review code.").unwrap();

    let mut config = AppConfig::parse(CONFIG).unwrap();
    config.storage.documentation_dir = docs.path().to_path_buf();

    let events = Arc::new(EventStore::in_memory());
    let state = AppState::new(Arc::new(config), Arc::clone(&events)).unwrap();
    Harness {
        router: build_api_router(Arc::new(state)),
        events,
        _docs: docs,
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =========================================================================
// Configured routes
// =========================================================================

#[tokio::test]
async fn configured_health_route_is_dispatched_and_logged() {
    let h = harness();
    let (status, body) = send(&h.router, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "status": "healthy", "message": "Server is running"})
    );

    let events = h.events.query_recent(10);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].route, "/api/health");
    assert_eq!(events[0].method, "GET");
    assert!(events[0].input.is_empty());
    assert_eq!(events[0].status, 200);
    assert!(events[0].success);
    assert_eq!(Value::Object(events[0].output.clone()), body);
}

#[tokio::test]
async fn query_parameters_reach_the_handler_and_the_event() {
    let h = harness();
    let (status, body) = send(&h.router, get("/api/get_agent_file?agent=code_quality_agent")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "You review code.");

    let events = h.events.query_recent(1);
    assert_eq!(events[0].input.get("agent"), Some(&json!("code_quality_agent")));
}

#[tokio::test]
async fn handler_client_errors_keep_their_status() {
    let h = harness();
    let (status, body) = send(&h.router, get("/api/get_agent_file")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Missing required parameter: agent"}));

    let events = h.events.query_recent(1);
    assert_eq!(events[0].status, 400);
    assert!(!events[0].success);
}

#[tokio::test]
async fn same_path_serves_two_methods() {
    let h = harness();
    let request = post_json("/api/get_agent_file", &json!({"agent": "code_quality_agent"}));
    let (status, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agent"], "code_quality_agent");

    let events = h.events.query_recent(1);
    assert_eq!(events[0].method, "POST");
    assert_eq!(Value::Object(events[0].input.clone()), json!({"agent": "code_quality_agent"}));
}

#[tokio::test]
async fn method_defaults_to_post() {
    let h = harness();
    let (status, _) = send(&h.router, post_json("/api/get_documentation_folders", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let response = h
        .router
        .clone()
        .oneshot(get("/api/get_documentation_folders"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn invalid_json_body_is_rejected_and_logged() {
    let h = harness();
    let request = Request::builder()
        .method("POST")
        .uri("/api/get_documentation_folders")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(h.events.query_recent(1)[0].status, 400);
}

#[tokio::test]
async fn rejected_configured_routes_are_not_served() {
    let h = harness();
    for uri in ["/api/incomplete", "/api/unknown", "/api/trace"] {
        let (status, body) = send(&h.router, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({"success": false, "error": "Not found"}));
    }
    assert!(h.events.query_recent(10).is_empty());
}

#[tokio::test]
async fn brace_paths_are_not_served() {
    let json = r#"{"api_details": {"routes": {
        "a_health": {"route": "/api/health", "method": "GET", "function": "health_check",
                     "function_file_relative_path": "functions/health.rs"},
        "b_unbalanced": {"route": "/api/{oops", "method": "GET", "function": "health_check",
                         "function_file_relative_path": "functions/health.rs"},
        "c_capture": {"route": "/api/{x}", "method": "GET", "function": "health_check",
                      "function_file_relative_path": "functions/health.rs"},
        "d_conflict": {"route": "/api/{y}", "method": "POST", "function": "health_check",
                       "function_file_relative_path": "functions/health.rs"}
    }}}"#;
    let config = AppConfig::parse(json).unwrap();
    let events = Arc::new(EventStore::in_memory());
    let state = AppState::new(Arc::new(config), Arc::clone(&events)).unwrap();
    let router = build_api_router(Arc::new(state));

    let (status, body) = send(&router, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    for request in [get("/api/anything"), get("/api/%7Boops"), post_json("/api/other", &json!({}))] {
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "error": "Not found"}));
    }
    assert_eq!(events.query_recent(10).len(), 1);
}

#[tokio::test]
async fn builtin_path_cannot_be_shadowed() {
    let h = harness();
    let (status, body) = send(&h.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "API server is running");
}

#[tokio::test]
async fn first_duplicate_wins() {
    let h = harness();
    let (_, body) = send(&h.router, get("/api/health")).await;
    assert_eq!(body["status"], "healthy");
}

// =========================================================================
// Built-in routes
// =========================================================================

#[tokio::test]
async fn builtin_routes_are_not_logged() {
    let h = harness();
    for uri in ["/health", "/events", "/api/get_last_100_api_calls", "/api/documentation", "/get_all_routes"] {
        let (status, _) = send(&h.router, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
    assert!(h.events.query_recent(10).is_empty());
}

#[tokio::test]
async fn events_endpoint_returns_newest_first() {
    let h = harness();
    send(&h.router, get("/api/health")).await;
    send(&h.router, get("/api/get_agent_file")).await;

    let (status, body) = send(&h.router, get("/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["events"][0]["route"], "/api/get_agent_file");
    assert_eq!(body["events"][1]["route"], "/api/health");
    assert!(body["events"][0]["timestamp"].is_string());

    let (_, alt) = send(&h.router, get("/api/get_last_100_api_calls")).await;
    assert_eq!(alt["count"], 2);
}

#[tokio::test]
async fn events_limit_is_honoured_and_validated() {
    let h = harness();
    for _ in 0..3 {
        send(&h.router, get("/api/health")).await;
    }

    let (_, body) = send(&h.router, get("/events?limit=2")).await;
    assert_eq!(body["count"], 2);

    let (_, body) = send(&h.router, get("/events?limit=-1")).await;
    assert_eq!(body["count"], 0);

    let (status, body) = send(&h.router, get("/events?limit=many")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn documentation_lists_all_routes() {
    let h = harness();
    let (status, doc) = send(&h.router, get("/api/documentation")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["success"], true);
    assert_eq!(doc["routes"]["health"]["route"], "/api/health");
    assert_eq!(doc["routes"]["builtin_health"]["route"], "/health");
    assert_eq!(doc["routes"]["events"]["method"], "GET");
    assert_eq!(
        doc["routes"]["folders"]["example_curl"],
        "curl -X POST http://localhost:8001/api/get_documentation_folders"
    );

    let (_, same) = send(&h.router, get("/get_all_routes")).await;
    assert_eq!(same, doc);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let h = harness();
    let request = Request::builder()
        .uri("/health")
        .header("origin", "http://localhost:8000")
        .body(Body::empty())
        .unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
