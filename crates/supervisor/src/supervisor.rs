//! Single-slot job supervisor.
//!
//! [`JobSupervisor::start`] reserves the slot, spawns the worker and hands
//! the process to a driver task. The driver streams output onto the bus,
//! waits for exit (or a stop request), then releases the slot and
//! publishes the job's terminal event. The slot is always released
//! *before* the terminal event goes out, so an observer reacting to that
//! event can immediately start the next job.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use csvtx_core::job_options::{build_worker_args, JobOptions};
use csvtx_core::progress::{ProgressParser, ProgressState};
use csvtx_core::types::{JobId, Timestamp};
use csvtx_events::{EventBus, JobEvent, JobEventKind, OutputStream};
use serde::Serialize;
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;
use crate::error::{JobError, StopResult};
use crate::lines::read_lines;
use crate::process;

/// Cap on the stderr text kept for the failure event (10 MiB).
const MAX_STDERR_BYTES: usize = 10 * 1024 * 1024;

/// How long output readers may keep draining after the worker exits.
///
/// Only reached when something else (a grandchild process) still holds
/// the worker's pipes open.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Job bookkeeping
// ---------------------------------------------------------------------------

/// Lifecycle of the job occupying the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Starting,
    Running,
    Completed,
    Failed,
    Killed,
}

impl JobState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Killed => "killed",
        }
    }
}

/// Bookkeeping for the live worker. Never leaves this module.
#[derive(Debug)]
struct JobHandle {
    id: JobId,
    pid: Option<u32>,
    started_at: Timestamp,
    state: JobState,
}

struct ActiveJob {
    handle: JobHandle,
    cancel: CancellationToken,
}

type Slot = Arc<Mutex<Option<ActiveJob>>>;

fn lock_slot(slot: &Mutex<Option<ActiveJob>>) -> MutexGuard<'_, Option<ActiveJob>> {
    // The slot holds plain data; a panic elsewhere cannot leave it torn.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the slot when the job that reserved it is done.
///
/// A stop request clears the slot itself, and the next job may already have
/// taken it by the time this guard drops, so only a slot still holding
/// `job_id` is cleared.
struct SlotGuard {
    slot: Slot,
    job_id: JobId,
}

impl SlotGuard {
    fn mark_running(&self, pid: Option<u32>) {
        let mut slot = lock_slot(&self.slot);
        if let Some(active) = slot.as_mut().filter(|a| a.handle.id == self.job_id) {
            active.handle.pid = pid;
            active.handle.state = JobState::Running;
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut slot = lock_slot(&self.slot);
        if slot.as_ref().is_some_and(|a| a.handle.id == self.job_id) {
            *slot = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Public result types
// ---------------------------------------------------------------------------

/// Summary of a job that ran to a zero exit code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub stdout_lines: u64,
    pub last_progress: Option<ProgressState>,
}

/// Handle to a started job.
///
/// Dropping the ticket does not affect the job; it keeps running and still
/// publishes its terminal event.
#[derive(Debug)]
pub struct JobTicket {
    job_id: JobId,
    pid: Option<u32>,
    handle: JoinHandle<Result<JobReport, JobError>>,
}

impl JobTicket {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the job to end.
    ///
    /// Resolves after the job's terminal event has been published.
    pub async fn wait(self) -> Result<JobReport, JobError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(JobError::Aborted(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// JobSupervisor
// ---------------------------------------------------------------------------

/// Owns the worker slot and publishes everything the worker does.
pub struct JobSupervisor {
    config: WorkerConfig,
    parser: Arc<dyn ProgressParser>,
    bus: Arc<EventBus>,
    slot: Slot,
    next_id: AtomicU64,
}

impl JobSupervisor {
    /// Create a supervisor using the config's completion markers for
    /// progress inference.
    pub fn new(config: WorkerConfig, bus: Arc<EventBus>) -> Self {
        let parser = Arc::new(config.progress_parser());
        Self::with_parser(config, bus, parser)
    }

    /// Create a supervisor with a custom progress parser.
    pub fn with_parser(
        config: WorkerConfig,
        bus: Arc<EventBus>,
        parser: Arc<dyn ProgressParser>,
    ) -> Self {
        Self {
            config,
            parser,
            bus,
            slot: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Whether a job currently holds the slot.
    pub fn is_running(&self) -> bool {
        lock_slot(&self.slot).is_some()
    }

    /// Launch the worker for `options`.
    ///
    /// Fails without publishing anything if the options are invalid or a
    /// job is already running. A spawn failure publishes `SpawnError` and
    /// frees the slot before returning. On success `Started` has been
    /// published and the returned ticket resolves when the job ends.
    ///
    /// The previous job's slot is released just before its terminal event is
    /// published, so a call racing that event may be accepted while the
    /// `Completed`/`Failed` for the previous job is still in flight.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, options: JobOptions) -> Result<JobTicket, JobError> {
        options.ensure_valid()?;

        let cancel = CancellationToken::new();
        let job_id = {
            let mut slot = lock_slot(&self.slot);
            if let Some(active) = slot.as_ref() {
                return Err(JobError::AlreadyRunning {
                    job_id: active.handle.id,
                });
            }
            let job_id = self.next_id.fetch_add(1, Ordering::Relaxed);
            *slot = Some(ActiveJob {
                handle: JobHandle {
                    id: job_id,
                    pid: None,
                    started_at: Utc::now(),
                    state: JobState::Starting,
                },
                cancel: cancel.clone(),
            });
            job_id
        };
        let guard = SlotGuard {
            slot: Arc::clone(&self.slot),
            job_id,
        };

        let args = build_worker_args(&self.config.script_path, &options);
        let mut child = match process::worker_command(&self.config, &args).spawn() {
            Ok(child) => child,
            Err(e) => {
                let message = format!("{}: {e}", self.config.program);
                tracing::error!(
                    job_id,
                    program = %self.config.program,
                    error = %e,
                    "Failed to spawn translation worker"
                );
                drop(guard);
                self.bus.publish(JobEvent::new(
                    job_id,
                    JobEventKind::SpawnError {
                        message: message.clone(),
                    },
                ));
                return Err(JobError::Spawn { message });
            }
        };

        let pid = child.id();
        guard.mark_running(pid);
        tracing::info!(
            job_id,
            pid,
            input = %options.input_path,
            output = %options.output_path,
            "Translation worker started"
        );
        self.bus.publish(JobEvent::new(
            job_id,
            JobEventKind::Started {
                pid,
                args: args.clone(),
            },
        ));

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let driver = JobDriver {
            job_id,
            bus: Arc::clone(&self.bus),
            parser: Arc::clone(&self.parser),
            kill_grace: self.config.kill_grace,
        };
        let handle = tokio::spawn(driver.run(child, stdout, stderr, cancel, guard));

        Ok(JobTicket {
            job_id,
            pid,
            handle,
        })
    }

    /// Ask the running worker to terminate.
    ///
    /// Returns immediately: the slot is freed at once and the job's
    /// terminal event follows when the process actually exits. Calling
    /// this with nothing running is a harmless no-op.
    pub fn stop(&self) -> StopResult {
        let Some(mut active) = lock_slot(&self.slot).take() else {
            return StopResult::not_running();
        };

        active.handle.state = JobState::Killed;
        let elapsed_ms = (Utc::now() - active.handle.started_at).num_milliseconds();
        tracing::info!(
            job_id = active.handle.id,
            pid = active.handle.pid,
            elapsed_ms,
            state = active.handle.state.as_str(),
            "Stopping translation worker"
        );
        active.cancel.cancel();
        StopResult::stopped(active.handle.id)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Everything the driver task needs, detached from the supervisor.
struct JobDriver {
    job_id: JobId,
    bus: Arc<EventBus>,
    parser: Arc<dyn ProgressParser>,
    kill_grace: Duration,
}

#[derive(Debug, Default)]
struct StdoutSummary {
    lines: u64,
    last_progress: Option<ProgressState>,
}

impl JobDriver {
    async fn run(
        self,
        mut child: Child,
        stdout: Option<ChildStdout>,
        stderr: Option<ChildStderr>,
        cancel: CancellationToken,
        guard: SlotGuard,
    ) -> Result<JobReport, JobError> {
        let start = Instant::now();

        let stdout_task = tokio::spawn(pump_stdout(
            stdout,
            self.job_id,
            Arc::clone(&self.bus),
            Arc::clone(&self.parser),
        ));
        let stderr_task = tokio::spawn(pump_stderr(stderr, self.job_id, Arc::clone(&self.bus)));

        let exited = tokio::select! {
            status = child.wait() => Some(status),
            () = cancel.cancelled() => None,
        };
        let (status, stopped) = match exited {
            Some(status) => (status, false),
            None => (self.terminate(&mut child).await, true),
        };

        let exit_code = match &status {
            Ok(status) => status.code().unwrap_or(-1),
            Err(e) => {
                tracing::error!(job_id = self.job_id, error = %e, "Failed to wait for worker");
                -1
            }
        };

        // Every line must be on the bus before the terminal event.
        let summary = self.drain(stdout_task, "stdout").await;
        let stderr_text = self.drain(stderr_task, "stderr").await;

        let duration_ms = start.elapsed().as_millis() as u64;
        // A zero exit is a success even when it answers a stop request.
        let state = if exit_code == 0 && status.is_ok() {
            JobState::Completed
        } else if stopped {
            JobState::Killed
        } else {
            JobState::Failed
        };
        tracing::info!(
            job_id = self.job_id,
            exit_code,
            duration_ms,
            stdout_lines = summary.lines,
            state = state.as_str(),
            "Translation worker exited"
        );

        drop(guard);

        if state == JobState::Completed {
            self.bus
                .publish(JobEvent::new(self.job_id, JobEventKind::Completed));
            return Ok(JobReport {
                job_id: self.job_id,
                exit_code,
                duration_ms,
                stdout_lines: summary.lines,
                last_progress: summary.last_progress,
            });
        }

        self.bus.publish(JobEvent::new(
            self.job_id,
            JobEventKind::Failed {
                exit_code,
                stderr: stderr_text.clone(),
            },
        ));
        if stopped {
            Err(JobError::Cancelled { exit_code })
        } else {
            Err(JobError::WorkerFailed {
                exit_code,
                stderr: stderr_text,
            })
        }
    }

    /// SIGTERM, then SIGKILL if the worker outlives the grace period.
    async fn terminate(&self, child: &mut Child) -> std::io::Result<std::process::ExitStatus> {
        if let Err(e) = process::terminate(child) {
            tracing::warn!(job_id = self.job_id, error = %e, "Failed to signal worker");
        }

        match tokio::time::timeout(self.kill_grace, child.wait()).await {
            Ok(status) => status,
            Err(_elapsed) => {
                tracing::warn!(
                    job_id = self.job_id,
                    grace_secs = self.kill_grace.as_secs(),
                    "Worker ignored SIGTERM, killing"
                );
                child.start_kill()?;
                child.wait().await
            }
        }
    }

    /// Wait for a reader task, giving up after [`OUTPUT_DRAIN_GRACE`].
    async fn drain<T: Default>(&self, mut task: JoinHandle<T>, stream: &str) -> T {
        match tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut task).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::error!(job_id = self.job_id, stream, error = %e, "Output reader failed");
                T::default()
            }
            Err(_elapsed) => {
                tracing::warn!(
                    job_id = self.job_id,
                    stream,
                    "Worker pipe still open after exit, abandoning reader"
                );
                task.abort();
                T::default()
            }
        }
    }
}

async fn pump_stdout(
    stdout: Option<ChildStdout>,
    job_id: JobId,
    bus: Arc<EventBus>,
    parser: Arc<dyn ProgressParser>,
) -> StdoutSummary {
    let mut summary = StdoutSummary::default();
    let Some(stdout) = stdout else {
        return summary;
    };

    let result = read_lines(stdout, |line| {
        summary.lines += 1;
        let progress = parser.interpret(&line);
        bus.publish(JobEvent::log_line(job_id, line, OutputStream::Stdout));
        if let Some(progress) = progress {
            summary.last_progress = Some(progress);
            bus.publish(JobEvent::progress(job_id, progress));
        }
    })
    .await;

    if let Err(e) = result {
        tracing::warn!(job_id, error = %e, "Error reading worker stdout");
    }
    summary
}

async fn pump_stderr(stderr: Option<ChildStderr>, job_id: JobId, bus: Arc<EventBus>) -> String {
    let mut collected = String::new();
    let Some(stderr) = stderr else {
        return collected;
    };

    let mut truncated = false;
    let result = read_lines(stderr, |line| {
        if collected.len() + line.len() < MAX_STDERR_BYTES {
            collected.push_str(&line);
            collected.push('\n');
        } else {
            truncated = true;
        }
        bus.publish(JobEvent::log_line(job_id, line, OutputStream::Stderr));
    })
    .await;

    if let Err(e) = result {
        tracing::warn!(job_id, error = %e, "Error reading worker stderr");
    }
    if truncated {
        collected.push_str("[stderr truncated]\n");
    }
    collected
}
