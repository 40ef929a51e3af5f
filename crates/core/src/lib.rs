//! Pure domain logic for the CSV translation job orchestrator.
//!
//! Nothing in this crate spawns processes or performs async I/O; it holds
//! the job option model, the worker argument contract, the progress
//! interpreter, and the pre-flight checks used by front-ends.

pub mod error;
pub mod job_options;
pub mod preflight;
pub mod progress;
pub mod types;
