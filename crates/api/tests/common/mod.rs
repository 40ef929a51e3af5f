#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use csvtx_api::config::ServerConfig;
use csvtx_api::router::build_app_router;
use csvtx_api::state::AppState;
use csvtx_api::ws::WsManager;
use csvtx_events::EventBus;
use csvtx_supervisor::WorkerConfig;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and runs `worker` as the translation worker.
pub fn test_config(worker: WorkerConfig) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        event_bus_capacity: 1024,
        job_log_path: None,
        worker,
    }
}

/// Shared state wired the same way `main.rs` wires it.
pub fn test_state(worker: WorkerConfig) -> AppState {
    AppState::new(
        test_config(worker),
        Arc::new(EventBus::default()),
        Arc::new(WsManager::new()),
    )
}

/// Full application router with the production middleware stack.
pub fn build_test_app(state: AppState) -> Router {
    let config = state.config.as_ref().clone();
    build_app_router(state, &config)
}

/// Router whose worker is a program that does not exist. Good for every
/// test that never starts a job.
pub fn build_idle_app() -> Router {
    build_test_app(test_state(WorkerConfig::new(
        "/nonexistent/csvtx/python3",
        "translate_csv.py",
    )))
}

/// Create a temporary bash script standing in for the translation worker.
pub fn write_temp_script(body: &str) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::Builder::new()
        .suffix(".sh")
        .tempfile()
        .expect("create temp file");
    writeln!(f, "#!/bin/bash").expect("write shebang");
    write!(f, "{body}").expect("write body");
    f
}

/// Worker config running `script` under bash.
pub fn bash_worker(script: &tempfile::NamedTempFile) -> WorkerConfig {
    WorkerConfig::new("bash", script.path().to_str().expect("path"))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.oneshot(request).await.expect("request")
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    app.oneshot(request).await.expect("request")
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.oneshot(request).await.expect("request")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
