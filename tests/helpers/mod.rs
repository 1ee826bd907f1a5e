//! Test helpers: a scriptable mock cracking server and a recording
//! display surface.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hashcat_courier::config::CourierConfig;
use hashcat_courier::display::DisplaySurface;

/// Scriptable behavior and hit counters for the mock cracking server.
#[derive(Default)]
pub struct MockState {
    pub upload_hits: AtomicUsize,
    pub status_hits: AtomicUsize,
    pub jobs_hits: AtomicUsize,
    /// Respond 500 to uploads.
    pub fail_uploads: AtomicBool,
    /// Respond 200 to uploads without a job_id in the body.
    pub omit_job_id: AtomicBool,
    /// Respond 500 to status requests.
    pub fail_statuses: AtomicBool,
    /// Respond 500 to job-list requests.
    pub fail_jobs: AtomicBool,
    /// Delay applied to each upload, for drain-overlap tests.
    pub upload_delay: Mutex<Option<Duration>>,
    /// Next job id to issue; a fresh uuid when unset.
    pub next_job_id: Mutex<Option<String>>,
    /// Job ids issued so far, in order.
    pub issued: Mutex<Vec<String>>,
    /// Scripted status bodies per job id.
    pub statuses: Mutex<HashMap<String, serde_json::Value>>,
    /// Entries served by the job-list endpoint.
    pub jobs: Mutex<Vec<serde_json::Value>>,
}

pub struct MockCracker {
    pub ip: String,
    pub port: u16,
    pub state: Arc<MockState>,
}

impl MockCracker {
    /// Courier config pointing at this mock. The poll interval is long
    /// enough that only explicit `poll_now` calls reach the server.
    pub fn config(&self) -> CourierConfig {
        serde_json::from_value(serde_json::json!({
            "server_ip": self.ip,
            "server_port": self.port,
            "poll_interval_secs": 3600,
        }))
        .unwrap()
    }

    pub fn upload_hits(&self) -> usize {
        self.state.upload_hits.load(Ordering::SeqCst)
    }

    pub fn status_hits(&self) -> usize {
        self.state.status_hits.load(Ordering::SeqCst)
    }

    pub fn jobs_hits(&self) -> usize {
        self.state.jobs_hits.load(Ordering::SeqCst)
    }

    pub fn set_status(&self, job_id: &str, body: serde_json::Value) {
        self.state
            .statuses
            .lock()
            .unwrap()
            .insert(job_id.to_string(), body);
    }
}

/// Start a mock cracking server on an ephemeral port.
pub async fn spawn_mock_cracker() -> MockCracker {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/upload", post(upload))
        .route("/status/{job_id}", get(status))
        .route("/api/jobs", get(jobs))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockCracker {
        ip: addr.ip().to_string(),
        port: addr.port(),
        state,
    }
}

async fn upload(
    State(state): State<Arc<MockState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<serde_json::Value>) {
    state.upload_hits.fetch_add(1, Ordering::SeqCst);

    let delay = *state.upload_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut capture_bytes = 0usize;
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("capture") {
            capture_bytes = field.bytes().await.unwrap().len();
        }
    }
    if capture_bytes == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "missing capture field" })),
        );
    }

    if state.fail_uploads.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "disk full" })),
        );
    }
    if state.omit_job_id.load(Ordering::SeqCst) {
        return (StatusCode::OK, Json(serde_json::json!({ "status": "success" })));
    }

    let job_id = state
        .next_job_id
        .lock()
        .unwrap()
        .take()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    state.issued.lock().unwrap().push(job_id.clone());
    (StatusCode::OK, Json(serde_json::json!({ "job_id": job_id })))
}

async fn status(
    State(state): State<Arc<MockState>>,
    Path(job_id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.status_hits.fetch_add(1, Ordering::SeqCst);

    if state.fail_statuses.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "backend down" })),
        );
    }
    match state.statuses.lock().unwrap().get(&job_id) {
        Some(body) => (StatusCode::OK, Json(body.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "unknown job" })),
        ),
    }
}

async fn jobs(
    State(state): State<Arc<MockState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.jobs_hits.fetch_add(1, Ordering::SeqCst);

    if state.fail_jobs.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "backend down" })),
        );
    }
    let entries = state.jobs.lock().unwrap().clone();
    (StatusCode::OK, Json(serde_json::Value::Array(entries)))
}

/// Config for tests that never reach the network.
pub fn offline_config() -> CourierConfig {
    serde_json::from_value(serde_json::json!({
        "server_ip": "127.0.0.1",
        "server_port": 9,
        "poll_interval_secs": 3600,
    }))
    .unwrap()
}

/// Display surface that records every call for assertions.
#[derive(Default)]
pub struct RecordingDisplay {
    pub elements: Vec<String>,
    pub values: HashMap<String, String>,
}

impl RecordingDisplay {
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }
}

impl DisplaySurface for RecordingDisplay {
    fn add_element(&mut self, key: &str, _label: &str) {
        self.elements.push(key.to_string());
    }

    fn remove_element(&mut self, key: &str) {
        self.elements.retain(|k| k != key);
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Fresh per-test scratch directory under the system temp dir.
pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("courier-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_file(dir: &std::path::Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
