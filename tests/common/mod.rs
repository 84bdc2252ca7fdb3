// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDateTime;
use dailymile_sync::config::Config;
use dailymile_sync::services::{DailymileService, GpxRenderer, InMemoryCacheStore, RateGate};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// One request seen by the fake API.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub until: Option<i64>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Scripted Dailymile API.
#[allow(dead_code)]
pub struct FakeDailymile {
    /// Feed entries, newest first
    pub entries: Vec<Value>,
    pub page_size: usize,
    /// Treat `until` as `<=` instead of `<`
    pub inclusive_until: bool,
    /// Answer listings with a bare array instead of `{"entries": [...]}`
    pub bare_array: bool,
    /// Force a status on listing requests
    pub list_status: Option<StatusCode>,
    pub create_response: (StatusCode, String),
    pub track_response: (StatusCode, String),
    pub token_status: StatusCode,
    pub requests: Vec<RecordedRequest>,
}

impl Default for FakeDailymile {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            page_size: 20,
            inclusive_until: false,
            bare_array: false,
            list_status: None,
            create_response: (StatusCode::CREATED, r#"{"id": 1001}"#.to_string()),
            track_response: (StatusCode::CREATED, r#"{"status": "ok"}"#.to_string()),
            token_status: StatusCode::OK,
            requests: Vec::new(),
        }
    }
}

type SharedFake = Arc<Mutex<FakeDailymile>>;

/// Running fake API.
pub struct FakeServer {
    pub base_url: String,
    pub state: SharedFake,
}

#[allow(dead_code)]
impl FakeServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// `until` values of every listing request, in order.
    pub fn list_cursors(&self) -> Vec<Option<i64>> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with("/entries.json") && r.method == "GET")
            .map(|r| r.until)
            .collect()
    }
}

/// Serve `fake` on an ephemeral local port.
pub async fn spawn_fake(fake: FakeDailymile) -> FakeServer {
    let state = Arc::new(Mutex::new(fake));
    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/people/me.json", get(me))
        .route("/people/{username}/entries.json", get(list_entries))
        .route("/entries.json", post(create_entry))
        .route("/entries/{id}/track.json", put(attach_track))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeServer {
        base_url: format!("http://{}", addr),
        state,
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn record(
    state: &SharedFake,
    method: &'static str,
    path: String,
    until: Option<i64>,
    headers: &HeaderMap,
    body: &[u8],
) {
    state.lock().unwrap().requests.push(RecordedRequest {
        method,
        path,
        until,
        authorization: header_value(headers, header::AUTHORIZATION),
        content_type: header_value(headers, header::CONTENT_TYPE),
        body: body.to_vec(),
    });
}

fn entry_timestamp(entry: &Value) -> i64 {
    let at = entry["at"].as_str().unwrap_or_default();
    NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M:%SZ")
        .map(|t| t.and_utc().timestamp())
        .unwrap_or(i64::MIN)
}

async fn token(State(state): State<SharedFake>, headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
    record(&state, "POST", "/oauth/token".to_string(), None, &headers, &body);
    let status = state.lock().unwrap().token_status;
    if status != StatusCode::OK {
        return (status, Json(json!({"error": "invalid_grant"})));
    }
    (StatusCode::OK, Json(json!({"access_token": "fresh-token"})))
}

async fn me(State(state): State<SharedFake>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    record(&state, "GET", "/people/me.json".to_string(), None, &headers, &[]);
    if header_value(&headers, header::AUTHORIZATION).as_deref() != Some("access_token fresh-token") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    (StatusCode::OK, Json(json!({"username": "runner42", "display_name": "Runner"})))
}

async fn list_entries(
    State(state): State<SharedFake>,
    Path(username): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let until = query.get("until").and_then(|v| v.parse::<i64>().ok());
    record(
        &state,
        "GET",
        format!("/people/{}/entries.json", username),
        until,
        &headers,
        &[],
    );

    let fake = state.lock().unwrap();
    if let Some(status) = fake.list_status {
        return (status, Json(json!({"error": "forced"})));
    }

    let page: Vec<Value> = fake
        .entries
        .iter()
        .filter(|e| match until {
            None => true,
            Some(u) if fake.inclusive_until => entry_timestamp(e) <= u,
            Some(u) => entry_timestamp(e) < u,
        })
        .take(fake.page_size)
        .cloned()
        .collect();

    if fake.bare_array {
        (StatusCode::OK, Json(Value::Array(page)))
    } else {
        (StatusCode::OK, Json(json!({ "entries": page })))
    }
}

async fn create_entry(State(state): State<SharedFake>, headers: HeaderMap, body: Bytes) -> (StatusCode, String) {
    record(&state, "POST", "/entries.json".to_string(), None, &headers, &body);
    state.lock().unwrap().create_response.clone()
}

async fn attach_track(
    State(state): State<SharedFake>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    record(&state, "PUT", format!("/entries/{}/track.json", id), None, &headers, &body);
    state.lock().unwrap().track_response.clone()
}

/// Feed entry with a workout.
#[allow(dead_code)]
pub fn workout_entry(id: u64, at: &str, activity_type: &str) -> Value {
    json!({
        "id": id,
        "at": at,
        "message": format!("entry {}", id),
        "workout": {
            "title": format!("Workout {}", id),
            "activity_type": activity_type,
            "duration": 1800,
            "distance": {"value": 5.0, "units": "kilometers"}
        }
    })
}

/// Rate gate that only counts permits.
#[derive(Default)]
pub struct CountingGate {
    pub permits: AtomicUsize,
}

#[allow(dead_code)]
impl CountingGate {
    pub fn count(&self) -> usize {
        self.permits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateGate for CountingGate {
    async fn acquire(&self) {
        self.permits.fetch_add(1, Ordering::SeqCst);
    }
}

/// Adapter pointed at a fake server, with short track backoff.
#[allow(dead_code)]
pub fn test_service(base_url: &str, gate: Arc<CountingGate>) -> DailymileService {
    test_service_with(base_url, gate, Arc::new(InMemoryCacheStore::new()), Duration::from_secs(5))
}

#[allow(dead_code)]
pub fn test_service_with(
    base_url: &str,
    gate: Arc<CountingGate>,
    cache: Arc<InMemoryCacheStore>,
    upload_cooldown: Duration,
) -> DailymileService {
    let config = Config {
        api_base_url: base_url.to_string(),
        upload_cooldown,
        track_upload_initial_backoff: Duration::from_millis(10),
        ..Config::default()
    };
    DailymileService::new(&config, gate, cache, Arc::new(GpxRenderer))
}
