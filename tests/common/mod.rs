// Common test utilities and helpers
#![allow(dead_code)]

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use jsonvault::config::{RemoteConfig, VaultConfig};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A facade configuration rooted in a fresh temporary directory.
///
/// The directory must outlive the facade, so it is returned alongside.
pub fn temp_config() -> (VaultConfig, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = VaultConfig::in_dir(dir.path());
    (config, dir)
}

/// Same as [`temp_config`] with the remote backend pointed at `base_url`.
pub fn temp_config_with_remote(base_url: &str) -> (VaultConfig, TempDir) {
    let (mut config, dir) = temp_config();
    config.remote = RemoteConfig::new(base_url);
    (config, dir)
}

#[derive(Default)]
pub struct CollectionState {
    pub resources: BTreeMap<u64, Value>,
    pub next_id: u64,
    /// `(method, path)` of every request seen, in order
    pub requests: Vec<(String, String)>,
    /// Answer the next request with this status and an empty object
    pub fail_next: Option<StatusCode>,
}

type Shared = Arc<Mutex<CollectionState>>;

/// An in-process JSON resource collection served under `/posts`.
///
/// Created resources get sequential numeric ids starting at 1. Unknown ids
/// answer 404 with `{}`.
pub struct FakeCollection {
    pub base_url: String,
    pub state: Shared,
}

impl FakeCollection {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(CollectionState {
            next_id: 1,
            ..CollectionState::default()
        }));

        let app = Router::new()
            .route("/posts", post(create))
            .route("/posts/{id}", get(read).put(replace).delete(remove))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake collection");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve fake collection");
        });

        Self {
            base_url: format!("http://{}/posts", addr),
            state,
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn resource(&self, id: u64) -> Option<Value> {
        self.state.lock().unwrap().resources.get(&id).cloned()
    }

    pub fn fail_next(&self, status: StatusCode) {
        self.state.lock().unwrap().fail_next = Some(status);
    }
}

fn record(state: &mut CollectionState, method: &str, path: String) -> Option<(StatusCode, Json<Value>)> {
    state.requests.push((method.to_string(), path));
    state
        .fail_next
        .take()
        .map(|status| (status, Json(json!({}))))
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({})))
}

fn with_id(id: u64, mut resource: Value) -> Value {
    if let Some(object) = resource.as_object_mut() {
        object.insert("id".to_string(), json!(id));
    }
    resource
}

async fn create(State(state): State<Shared>, Json(resource): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    if let Some(failure) = record(&mut state, "POST", "/posts".to_string()) {
        return failure;
    }
    let id = state.next_id;
    state.next_id += 1;
    let resource = with_id(id, resource);
    state.resources.insert(id, resource.clone());
    (StatusCode::CREATED, Json(resource))
}

async fn read(State(state): State<Shared>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    if let Some(failure) = record(&mut state, "GET", format!("/posts/{}", id)) {
        return failure;
    }
    match id.parse::<u64>().ok().and_then(|id| state.resources.get(&id).cloned()) {
        Some(resource) => (StatusCode::OK, Json(resource)),
        None => not_found(),
    }
}

async fn replace(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(resource): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    if let Some(failure) = record(&mut state, "PUT", format!("/posts/{}", id)) {
        return failure;
    }
    let Some(id) = id.parse::<u64>().ok().filter(|id| state.resources.contains_key(id)) else {
        return not_found();
    };
    let resource = with_id(id, resource);
    state.resources.insert(id, resource.clone());
    (StatusCode::OK, Json(resource))
}

async fn remove(State(state): State<Shared>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    if let Some(failure) = record(&mut state, "DELETE", format!("/posts/{}", id)) {
        return failure;
    }
    match id.parse::<u64>().ok().and_then(|id| state.resources.remove(&id)) {
        Some(_) => (StatusCode::OK, Json(json!({}))),
        None => not_found(),
    }
}
