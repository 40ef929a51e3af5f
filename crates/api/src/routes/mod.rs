pub mod files;
pub mod health;
pub mod jobs;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                          WebSocket job event stream
///
/// /jobs                        start a job (POST)
/// /jobs/current                whether a job is running (GET)
/// /jobs/stop                   stop the running job (POST)
/// /jobs/preflight              validate options, list warnings (POST)
///
/// /files/exists                path existence check (GET ?path=)
/// /files/default-output        derive the output path for an input (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/jobs", jobs::router())
        .nest("/files", files::router())
}
