use axum::routing::{get, post};
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// Routes mounted at `/files`.
///
/// ```text
/// GET    /exists?path=...  -> path_exists
/// POST   /default-output   -> default_output
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/exists", get(files::path_exists))
        .route("/default-output", post(files::default_output))
}
