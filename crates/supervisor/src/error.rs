use csvtx_core::error::CoreError;
use csvtx_core::types::JobId;
use serde::Serialize;

/// Why a job could not start or did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The submitted options failed validation; nothing was spawned.
    #[error(transparent)]
    InvalidOptions(#[from] CoreError),

    /// Another job still holds the worker slot.
    #[error("A translation job is already running (job {job_id})")]
    AlreadyRunning { job_id: JobId },

    /// The worker process could not be launched.
    #[error("Failed to start worker: {message}")]
    Spawn { message: String },

    /// The worker exited with a nonzero code (`-1` if killed by a signal).
    #[error("Worker exited with code {exit_code}: {stderr}")]
    WorkerFailed { exit_code: i32, stderr: String },

    /// The job was stopped before the worker finished.
    #[error("Worker was stopped (exit code {exit_code})")]
    Cancelled { exit_code: i32 },

    /// The task driving the job panicked or was aborted.
    #[error("Job driver aborted: {0}")]
    Aborted(String),
}

/// Outcome of a stop request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopResult {
    pub stopped: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl StopResult {
    pub fn stopped(job_id: JobId) -> Self {
        Self {
            stopped: true,
            message: "Translation stopped".to_string(),
            job_id: Some(job_id),
        }
    }

    pub fn not_running() -> Self {
        Self {
            stopped: false,
            message: "No translation job is running".to_string(),
            job_id: None,
        }
    }
}
