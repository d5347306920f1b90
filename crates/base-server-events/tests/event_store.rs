//! Integration tests for the directory-backed event store.
//!
//! Each test gets its own temporary storage area so the tests can run in
//! parallel without seeing each other's units.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use base_server_events::{ApiEvent, EventStore, NewEvent, is_success_status};
use serde_json::{Map, Value, json};

fn envelope(route: &str, method: &str, status: u16) -> NewEvent {
    NewEvent {
        route: route.to_owned(),
        method: method.to_owned(),
        input: Map::new(),
        output: Map::new(),
        status,
        success: is_success_status(status),
    }
}

fn unit_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    files.sort();
    files
}

#[test]
fn single_health_event_round_trips() {
    let root = tempfile::tempdir().unwrap();
    let store = EventStore::open(root.path().join("events"));

    let mut output = Map::new();
    output.insert("status".to_owned(), json!("healthy"));
    store.append(NewEvent {
        output: output.clone(),
        ..envelope("/health", "GET", 200)
    });

    let events = store.query_recent(1);
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.route, "/health");
    assert_eq!(event.method, "GET");
    assert!(event.input.is_empty());
    assert_eq!(event.output, output);
    assert_eq!(event.status, 200);
    assert!(event.success);
}

#[test]
fn persisted_unit_is_a_plain_json_object() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("events");
    let store = EventStore::open(&dir);
    store.append(envelope("/api/health", "GET", 200));

    let files = unit_files(&dir);
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_str().unwrap().to_owned();
    assert!(name.ends_with(".json"));
    let stem = name.trim_end_matches(".json");
    let seconds = stem.split('.').next().unwrap();
    assert_eq!(seconds.len(), 10);
    assert!(seconds.chars().all(|c| c.is_ascii_digit()));

    let raw: Value = serde_json::from_str(&fs::read_to_string(&files[0]).unwrap()).unwrap();
    let object = raw.as_object().unwrap();
    assert_eq!(object.len(), 7);
    for field in ["timestamp", "route", "method", "input", "output", "status", "success"] {
        assert!(object.contains_key(field), "missing field {field}");
    }
    assert!(raw["timestamp"].is_string());
    assert!(raw["input"].is_object());
    assert!(raw["output"].is_object());
    assert!(raw["status"].is_u64());
    assert!(raw["success"].is_boolean());
}

#[test]
fn newest_hundred_of_one_hundred_fifty() {
    let root = tempfile::tempdir().unwrap();
    let store = EventStore::open(root.path().join("events"));

    for i in 0..150 {
        store.append(envelope(&format!("/call/{i}"), "POST", 201));
    }

    let events = store.query_recent(100);
    assert_eq!(events.len(), 100);
    let routes: Vec<&str> = events.iter().map(|e| e.route.as_str()).collect();
    let expected: Vec<String> = (50..150).rev().map(|i| format!("/call/{i}")).collect();
    assert_eq!(routes, expected);
}

#[test]
fn results_are_strictly_newest_first() {
    let root = tempfile::tempdir().unwrap();
    let store = EventStore::open(root.path().join("events"));
    for i in 0..20 {
        store.append(envelope(&format!("/r/{i}"), "GET", 200));
    }

    let events = store.query_recent(20);
    assert_eq!(events.len(), 20);
    for pair in events.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
    assert_eq!(events[0].route, "/r/19");
    assert_eq!(events[19].route, "/r/0");
}

#[test]
fn limit_bounds_the_result() {
    let root = tempfile::tempdir().unwrap();
    let store = EventStore::open(root.path().join("events"));
    for i in 0..5 {
        store.append(envelope(&format!("/b/{i}"), "GET", 200));
    }

    assert_eq!(store.query_recent(0).len(), 0);
    assert_eq!(store.query_recent(3).len(), 3);
    assert_eq!(store.query_recent(5).len(), 5);
    assert_eq!(store.query_recent(500).len(), 5);
}

#[test]
fn fresh_storage_area_is_empty() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("never-written");
    let store = EventStore::open(&dir);

    assert!(store.query_recent(100).is_empty());
    assert!(!dir.exists());
}

#[test]
fn corrupted_unit_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("events");
    let store = EventStore::open(&dir);
    store.append(envelope("/health", "GET", 200));

    let files = unit_files(&dir);
    fs::write(&files[0], "{\"timestamp\": ").unwrap();

    assert!(store.query_recent(1).is_empty());
    assert_eq!(store.stats().skipped_units, 1);
}

#[test]
fn corrupted_unit_does_not_hide_the_rest() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("events");
    let store = EventStore::open(&dir);
    for i in 0..4 {
        store.append(envelope(&format!("/k/{i}"), "GET", 200));
    }

    let files = unit_files(&dir);
    fs::write(&files[1], "garbage").unwrap();

    let routes: Vec<String> = store
        .query_recent(10)
        .into_iter()
        .map(|e| e.route)
        .collect();
    assert_eq!(routes, ["/k/3", "/k/2", "/k/0"]);
}

#[test]
fn repeated_appends_create_the_area_once() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("deeply").join("nested").join("events");
    let store = EventStore::open(&dir);

    for _ in 0..10 {
        store.append(envelope("/health", "GET", 200));
    }

    assert_eq!(store.stats().failed_appends, 0);
    assert_eq!(unit_files(&dir).len(), 10);
    assert_eq!(store.query_recent(100).len(), 10);
}

#[test]
fn two_stores_share_one_area() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("events");
    let writer = EventStore::open(&dir);
    let reader = EventStore::open(&dir);

    writer.append(envelope("/shared", "DELETE", 204));

    let events = reader.query_recent(10);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].method, "DELETE");
}

#[test]
fn concurrent_appends_all_land() {
    let root = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(EventStore::open(root.path().join("events")));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..25 {
                    store.append(envelope(&format!("/t{t}/{i}"), "GET", 200));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.stats().failed_appends, 0);
    assert_eq!(store.query_recent(1000).len(), 200);
}

#[test]
fn units_written_by_the_previous_format_are_readable() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("events");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("1717236000.123456.json"),
        r#"{"timestamp": "2024-06-01T10:00:00.123456", "route": "/api/health", "method": "GET",
            "input": {}, "output": {"success": true, "status": "healthy"}, "status": 200, "success": true}"#,
    )
    .unwrap();

    let store = EventStore::open(&dir);
    store.append(envelope("/later", "GET", 200));

    let events: Vec<ApiEvent> = store.query_recent(10);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].route, "/later");
    assert_eq!(events[1].route, "/api/health");
    assert_eq!(events[1].output["status"], "healthy");
}
