//! Lifecycle management for the external translation worker.
//!
//! [`JobSupervisor`] owns at most one worker process at a time. It builds
//! the worker command line from validated [`JobOptions`], streams the
//! worker's output onto the [`EventBus`] as [`JobEvent`]s (with progress
//! derived by a [`ProgressParser`]), and resolves each job with exactly one
//! terminal event.
//!
//! [`JobOptions`]: csvtx_core::job_options::JobOptions
//! [`EventBus`]: csvtx_events::EventBus
//! [`JobEvent`]: csvtx_events::JobEvent
//! [`ProgressParser`]: csvtx_core::progress::ProgressParser

pub mod config;
pub mod error;
pub mod lines;
mod process;
pub mod supervisor;

pub use config::WorkerConfig;
pub use error::{JobError, StopResult};
pub use supervisor::{JobReport, JobSupervisor, JobTicket};
