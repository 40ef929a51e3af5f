//! Route definitions for translation job control.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST   /                 -> start_job
/// GET    /current          -> current_job
/// POST   /stop             -> stop_job
/// POST   /preflight        -> preflight_check
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(jobs::start_job))
        .route("/current", get(jobs::current_job))
        .route("/stop", post(jobs::stop_job))
        .route("/preflight", post(jobs::preflight_check))
}
