//! Job options submitted by a front-end and the worker argument contract.
//!
//! The worker script is invoked as
//! `<script> <input> -o <output> -s <source> -t <target>... [--overwrite]`.
//! Argument order is part of the worker's interface and must not change.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Source column used when a front-end does not specify one.
pub const DEFAULT_SOURCE_COLUMN: &str = "ZH";

/// Target columns used when a front-end does not specify any.
pub const DEFAULT_TARGET_COLUMNS: [&str; 2] = ["TH", "VN"];

/// Flag appended to the worker arguments when existing cells may be replaced.
pub const OVERWRITE_FLAG: &str = "--overwrite";

/// Maximum length of a single column identifier.
const MAX_COLUMN_LEN: usize = 128;

// ---------------------------------------------------------------------------
// JobOptions
// ---------------------------------------------------------------------------

/// Caller-supplied options for one translation job.
///
/// Immutable once submitted to the supervisor. Paths are only checked for
/// shape here; whether they exist is a front-end concern (see
/// [`crate::preflight`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct JobOptions {
    /// CSV file to translate.
    #[validate(
        length(min = 1, message = "input_path must not be empty"),
        custom(function = "validate_path_argument")
    )]
    pub input_path: String,

    /// Where the translated CSV is written.
    #[validate(
        length(min = 1, message = "output_path must not be empty"),
        custom(function = "validate_path_argument")
    )]
    pub output_path: String,

    /// Column holding the source-language text.
    #[serde(default = "default_source_column")]
    #[validate(custom(function = "validate_column"))]
    pub source_column: String,

    /// Columns to fill, in the order the worker should process them.
    #[validate(
        length(min = 1, message = "at least one target column is required"),
        custom(function = "validate_target_columns")
    )]
    pub target_columns: Vec<String>,

    /// Leave cells that already hold a translation untouched.
    #[serde(default = "default_skip_existing")]
    pub skip_existing: bool,
}

fn default_source_column() -> String {
    DEFAULT_SOURCE_COLUMN.to_string()
}

fn default_skip_existing() -> bool {
    true
}

impl JobOptions {
    /// Build options with the default source/target columns and
    /// `skip_existing = true`.
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            source_column: default_source_column(),
            target_columns: DEFAULT_TARGET_COLUMNS.iter().map(|c| c.to_string()).collect(),
            skip_existing: true,
        }
    }

    /// Whether the worker is asked to replace existing translations.
    pub fn overwrite(&self) -> bool {
        !self.skip_existing
    }

    /// Run all field validators, mapping failures to [`CoreError::Validation`].
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        self.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Values that start with `-` would be parsed as flags by the worker.
fn looks_like_flag(value: &str) -> bool {
    value.starts_with('-')
}

fn validate_path_argument(path: &str) -> Result<(), ValidationError> {
    if looks_like_flag(path) {
        return Err(ValidationError::new("path_looks_like_flag")
            .with_message("paths must not start with '-'".into()));
    }
    Ok(())
}

/// A column identifier must be non-blank, reasonably short, and must not
/// start with `-`.
fn validate_column(column: &str) -> Result<(), ValidationError> {
    if column.trim().is_empty() {
        return Err(ValidationError::new("column_empty")
            .with_message("column identifiers must not be blank".into()));
    }
    if column.len() > MAX_COLUMN_LEN {
        return Err(ValidationError::new("column_too_long").with_message(
            format!("column identifiers must not exceed {MAX_COLUMN_LEN} bytes").into(),
        ));
    }
    if looks_like_flag(column) {
        return Err(ValidationError::new("column_looks_like_flag")
            .with_message("column identifiers must not start with '-'".into()));
    }
    Ok(())
}

/// Target columns form an ordered set: every entry valid, no duplicates.
fn validate_target_columns(columns: &[String]) -> Result<(), ValidationError> {
    for (idx, column) in columns.iter().enumerate() {
        validate_column(column)?;
        if columns[..idx].contains(column) {
            return Err(ValidationError::new("duplicate_target_column")
                .with_message(format!("target column '{column}' is listed twice").into()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Worker arguments
// ---------------------------------------------------------------------------

/// Build the worker argument vector for `options`.
///
/// The result is passed verbatim to the interpreter program, so the script
/// path comes first.
pub fn build_worker_args(script_path: &str, options: &JobOptions) -> Vec<String> {
    let mut args = Vec::with_capacity(7 + options.target_columns.len() + 1);
    args.push(script_path.to_string());
    args.push(options.input_path.clone());
    args.push("-o".to_string());
    args.push(options.output_path.clone());
    args.push("-s".to_string());
    args.push(options.source_column.clone());
    args.push("-t".to_string());
    args.extend(options.target_columns.iter().cloned());
    if options.overwrite() {
        args.push(OVERWRITE_FLAG.to_string());
    }
    args
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn options(skip_existing: bool) -> JobOptions {
        JobOptions {
            input_path: "/a.csv".to_string(),
            output_path: "/b.csv".to_string(),
            source_column: "EN".to_string(),
            target_columns: vec!["TH".to_string(), "VN".to_string()],
            skip_existing,
        }
    }

    #[test]
    fn args_request_overwrite_when_not_skipping() {
        let args = build_worker_args("translate_csv.py", &options(false));
        assert_eq!(
            args,
            [
                "translate_csv.py",
                "/a.csv",
                "-o",
                "/b.csv",
                "-s",
                "EN",
                "-t",
                "TH",
                "VN",
                "--overwrite"
            ]
        );
    }

    #[test]
    fn args_omit_overwrite_when_skipping_existing() {
        let args = build_worker_args("translate_csv.py", &options(true));
        assert_eq!(args.last().map(String::as_str), Some("VN"));
        assert!(!args.iter().any(|a| a == OVERWRITE_FLAG));
    }

    #[test]
    fn new_uses_default_columns() {
        let opts = JobOptions::new("in.csv", "out.csv");
        assert_eq!(opts.source_column, "ZH");
        assert_eq!(opts.target_columns, ["TH", "VN"]);
        assert!(opts.skip_existing);
        assert!(opts.ensure_valid().is_ok());
    }

    #[test]
    fn empty_target_columns_rejected() {
        let mut opts = options(true);
        opts.target_columns.clear();
        assert_matches!(opts.ensure_valid(), Err(CoreError::Validation(msg)) if msg.contains("target column"));
    }

    #[test]
    fn empty_paths_rejected() {
        let mut opts = options(true);
        opts.input_path.clear();
        assert_matches!(opts.ensure_valid(), Err(CoreError::Validation(_)));

        let mut opts = options(true);
        opts.output_path.clear();
        assert_matches!(opts.ensure_valid(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn duplicate_target_column_rejected() {
        let mut opts = options(true);
        opts.target_columns.push("TH".to_string());
        assert_matches!(opts.ensure_valid(), Err(CoreError::Validation(msg)) if msg.contains("listed twice"));
    }

    #[test]
    fn flag_like_values_rejected() {
        let mut opts = options(true);
        opts.source_column = "--overwrite".to_string();
        assert!(opts.ensure_valid().is_err());

        let mut opts = options(true);
        opts.output_path = "-o".to_string();
        assert!(opts.ensure_valid().is_err());
    }

    #[test]
    fn blank_column_rejected() {
        let mut opts = options(true);
        opts.target_columns = vec!["  ".to_string()];
        assert!(opts.ensure_valid().is_err());
    }

    #[test]
    fn deserialize_applies_defaults() {
        let opts: JobOptions = serde_json::from_value(serde_json::json!({
            "input_path": "in.csv",
            "output_path": "out.csv",
            "target_columns": ["TH"],
        }))
        .expect("deserialize");
        assert_eq!(opts.source_column, DEFAULT_SOURCE_COLUMN);
        assert!(opts.skip_existing);
        assert!(!opts.overwrite());
    }
}
