//! Request handlers.
//!
//! Handlers delegate to the supervisor or the pre-flight helpers in
//! `csvtx_core` and map errors via [`AppError`](crate::error::AppError).

pub mod files;
pub mod jobs;
