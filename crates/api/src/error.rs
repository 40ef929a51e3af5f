use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use csvtx_core::error::CoreError;
use csvtx_supervisor::JobError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`JobError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `csvtx_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The supervisor refused or failed a job.
    #[error(transparent)]
    Job(#[from] JobError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- Supervisor errors ---
            AppError::Job(job) => match job {
                JobError::InvalidOptions(core) => classify_core_error(core),
                JobError::AlreadyRunning { .. } => {
                    (StatusCode::CONFLICT, "JOB_RUNNING", job.to_string())
                }
                JobError::Spawn { message } => {
                    tracing::error!(error = %message, "Worker spawn failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "SPAWN_ERROR",
                        job.to_string(),
                    )
                }
                JobError::WorkerFailed { .. }
                | JobError::Cancelled { .. }
                | JobError::Aborted(_) => {
                    tracing::error!(error = %job, "Job error reached HTTP layer");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
    }
}
