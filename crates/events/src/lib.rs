//! Job event stream for the CSV translation orchestrator.
//!
//! - [`JobEvent`]: one observation about a job (output line, progress,
//!   terminal status), tagged with the job it belongs to.
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; every [`Subscription`] sees every event.
//! - [`JobLogWriter`]: background observer that appends events to a log
//!   file.

pub mod bus;
pub mod event;
pub mod log_writer;

pub use bus::{EventBus, Subscription};
pub use event::{JobEvent, JobEventKind, OutputStream};
pub use log_writer::JobLogWriter;
