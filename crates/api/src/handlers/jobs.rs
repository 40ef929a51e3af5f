//! Handlers for starting, stopping and inspecting translation jobs.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use csvtx_core::job_options::JobOptions;
use csvtx_core::preflight::{self, PreflightWarning};
use csvtx_core::types::JobId;
use csvtx_supervisor::StopResult;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Returned when a job has been launched.
#[derive(Debug, Serialize)]
pub struct StartedJob {
    pub job_id: JobId,
    pub pid: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CurrentJob {
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct PreflightReport {
    pub warnings: Vec<PreflightWarning>,
    /// Human-readable rendering of `warnings`, in the same order.
    pub messages: Vec<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /jobs
///
/// Launch the worker. Responds 202 as soon as the process is running;
/// output, progress and the outcome arrive over `/ws`.
pub async fn start_job(
    State(state): State<AppState>,
    Json(options): Json<JobOptions>,
) -> AppResult<(StatusCode, Json<DataResponse<StartedJob>>)> {
    let ticket = state.supervisor.start(options)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: StartedJob {
                job_id: ticket.job_id(),
                pid: ticket.pid(),
            },
        }),
    ))
}

/// GET /jobs/current
pub async fn current_job(State(state): State<AppState>) -> Json<DataResponse<CurrentJob>> {
    Json(DataResponse {
        data: CurrentJob {
            running: state.supervisor.is_running(),
        },
    })
}

/// POST /jobs/stop
///
/// Always 200; `stopped` is false when nothing was running.
pub async fn stop_job(State(state): State<AppState>) -> Json<DataResponse<StopResult>> {
    Json(DataResponse {
        data: state.supervisor.stop(),
    })
}

/// POST /jobs/preflight
///
/// Validate `options` and report advisory warnings without starting
/// anything.
pub async fn preflight_check(
    Json(options): Json<JobOptions>,
) -> AppResult<Json<DataResponse<PreflightReport>>> {
    options.ensure_valid()?;

    let warnings = preflight::check(&options);
    let messages = warnings.iter().map(ToString::to_string).collect();

    Ok(Json(DataResponse {
        data: PreflightReport { warnings, messages },
    }))
}
