//! The [`JobEvent`] envelope and its payload kinds.

use chrono::Utc;
use csvtx_core::progress::ProgressState;
use csvtx_core::types::{JobId, Timestamp};
use serde::{Deserialize, Serialize};

/// Which worker pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// What happened.
///
/// Exactly one terminal kind (`Completed`, `Failed`, `SpawnError`) is
/// published per job attempt, and it is the last event for that job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEventKind {
    /// The worker process was spawned.
    Started { pid: Option<u32>, args: Vec<String> },
    /// One complete line of worker output.
    LogLine { text: String, stream: OutputStream },
    /// Progress derived from the preceding stdout line.
    Progress(ProgressState),
    /// The worker exited with code 0.
    Completed,
    /// The worker exited nonzero (`-1` when killed by a signal).
    Failed { exit_code: i32, stderr: String },
    /// The worker could not be launched.
    SpawnError { message: String },
}

/// A single event about one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: JobId,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub kind: JobEventKind,
}

impl JobEvent {
    /// Create an event stamped with the current time.
    pub fn new(job_id: JobId, kind: JobEventKind) -> Self {
        Self {
            job_id,
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn log_line(job_id: JobId, text: impl Into<String>, stream: OutputStream) -> Self {
        Self::new(
            job_id,
            JobEventKind::LogLine {
                text: text.into(),
                stream,
            },
        )
    }

    pub fn progress(job_id: JobId, progress: ProgressState) -> Self {
        Self::new(job_id, JobEventKind::Progress(progress))
    }

    /// Whether no further events will follow for this job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            JobEventKind::Completed | JobEventKind::Failed { .. } | JobEventKind::SpawnError { .. }
        )
    }

    /// One-line human readable rendering, used by the job log.
    pub fn describe(&self) -> String {
        match &self.kind {
            JobEventKind::Started { pid, args } => match pid {
                Some(pid) => format!("started pid {pid}: {}", args.join(" ")),
                None => format!("started: {}", args.join(" ")),
            },
            JobEventKind::LogLine { text, stream } => format!("{stream}: {text}"),
            JobEventKind::Progress(p) => {
                format!("progress {}/{} ({}%)", p.current, p.total, p.percent)
            }
            JobEventKind::Completed => "completed".to_string(),
            JobEventKind::Failed { exit_code, stderr } => {
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    format!("failed with exit code {exit_code}")
                } else {
                    format!("failed with exit code {exit_code}: {stderr}")
                }
            }
            JobEventKind::SpawnError { message } => format!("spawn error: {message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
