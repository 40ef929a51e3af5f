//! Persistent job log.
//!
//! [`JobLogWriter`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and appends one line per [`JobEvent`] to a file. It runs as a
//! long-lived background task and shuts down when the bus is dropped.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::bus::Subscription;
use crate::event::JobEvent;

/// Background observer that appends every event to a log file.
pub struct JobLogWriter {
    path: PathBuf,
    file: File,
}

impl JobLogWriter {
    /// Open (or create) the log file in append mode.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self { path, file })
    }

    /// Run the logging loop until the bus closes.
    ///
    /// Write failures are logged and the loop keeps going; a full disk
    /// should not take down the job it is describing.
    pub async fn run(mut self, mut subscription: Subscription) {
        tracing::info!(path = %self.path.display(), "Job log writer started");
        while let Some(event) = subscription.next().await {
            if let Err(e) = self.write(&event).await {
                tracing::error!(
                    error = %e,
                    path = %self.path.display(),
                    job_id = event.job_id,
                    "Failed to write job log entry"
                );
            }
        }
        tracing::info!("Event bus closed, job log writer shutting down");
    }

    async fn write(&mut self, event: &JobEvent) -> std::io::Result<()> {
        let line = format_entry(event);
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await
    }
}

/// `<rfc3339 timestamp> [job <id>] <description>\n`
fn format_entry(event: &JobEvent) -> String {
    format!(
        "{} [job {}] {}\n",
        event.timestamp.to_rfc3339(),
        event.job_id,
        event.describe()
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
