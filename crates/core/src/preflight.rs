//! Advisory checks a front-end runs before submitting a job.
//!
//! The supervisor never enforces any of these; they only produce warnings
//! for the operator.

use std::path::Path;

use serde::Serialize;

use crate::job_options::JobOptions;

/// Suffix inserted before the extension of a derived output path.
const OUTPUT_SUFFIX: &str = "_translated";

/// Whether `path` currently exists on the filesystem.
pub fn path_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Derive the conventional output path for an input file.
///
/// `data/list.CSV` becomes `data/list_translated.csv`; inputs without a
/// `.csv` extension get the suffix and extension appended.
pub fn default_output_path(input_path: &str) -> String {
    let stem = input_path
        .len()
        .checked_sub(4)
        .and_then(|start| input_path.get(start..).map(|ext| (start, ext)))
        .filter(|(_, ext)| ext.eq_ignore_ascii_case(".csv"))
        .map_or(input_path, |(start, _)| &input_path[..start]);
    format!("{stem}{OUTPUT_SUFFIX}.csv")
}

/// A condition worth showing the operator before a job starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreflightWarning {
    /// The input file does not exist; the worker will fail.
    InputMissing { path: String },
    /// The output file exists. With `overwrite` the worker replaces existing
    /// translations, otherwise it only fills empty cells.
    OutputExists { path: String, overwrite: bool },
    /// Input and output are the same file.
    OutputIsInput { path: String },
}

impl std::fmt::Display for PreflightWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputMissing { path } => write!(f, "Input file does not exist: {path}"),
            Self::OutputExists {
                path,
                overwrite: true,
            } => write!(f, "Output file exists and translations will be overwritten: {path}"),
            Self::OutputExists {
                path,
                overwrite: false,
            } => write!(f, "Output file exists; only empty cells will be filled: {path}"),
            Self::OutputIsInput { path } => {
                write!(f, "Output file is the same as the input file: {path}")
            }
        }
    }
}

/// Collect pre-flight warnings for `options`.
pub fn check(options: &JobOptions) -> Vec<PreflightWarning> {
    let mut warnings = Vec::new();

    if !path_exists(&options.input_path) {
        warnings.push(PreflightWarning::InputMissing {
            path: options.input_path.clone(),
        });
    }

    if options.input_path == options.output_path {
        warnings.push(PreflightWarning::OutputIsInput {
            path: options.output_path.clone(),
        });
    } else if path_exists(&options.output_path) {
        warnings.push(PreflightWarning::OutputExists {
            path: options.output_path.clone(),
            overwrite: options.overwrite(),
        });
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_replaces_csv_extension() {
        assert_eq!(default_output_path("/data/list.csv"), "/data/list_translated.csv");
        assert_eq!(default_output_path("list.CSV"), "list_translated.csv");
    }

    #[test]
    fn default_output_appends_when_no_extension() {
        assert_eq!(default_output_path("notes.txt"), "notes.txt_translated.csv");
        assert_eq!(default_output_path("csv"), "csv_translated.csv");
        assert_eq!(default_output_path("表格"), "表格_translated.csv");
    }

    #[test]
    fn path_exists_reports_filesystem_state() {
        let file = tempfile::NamedTempFile::new().expect("create temp file");
        assert!(path_exists(file.path()));
        assert!(!path_exists("/nonexistent/csvtx/input.csv"));
    }

    #[test]
    fn check_flags_missing_input() {
        let opts = JobOptions::new("/nonexistent/in.csv", "/nonexistent/out.csv");
        assert_eq!(
            check(&opts),
            vec![PreflightWarning::InputMissing {
                path: "/nonexistent/in.csv".to_string()
            }]
        );
    }

    #[test]
    fn check_flags_existing_output() {
        let input = tempfile::NamedTempFile::new().expect("create input");
        let output = tempfile::NamedTempFile::new().expect("create output");
        let mut opts = JobOptions::new(
            input.path().to_str().expect("path"),
            output.path().to_str().expect("path"),
        );
        opts.skip_existing = false;

        let warnings = check(&opts);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            PreflightWarning::OutputExists { overwrite: true, .. }
        ));
        assert!(warnings[0].to_string().contains("overwritten"));
    }

    #[test]
    fn check_flags_output_equal_to_input() {
        let input = tempfile::NamedTempFile::new().expect("create input");
        let path = input.path().to_str().expect("path");
        let opts = JobOptions::new(path, path);
        assert_eq!(
            check(&opts),
            vec![PreflightWarning::OutputIsInput {
                path: path.to_string()
            }]
        );
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let json = serde_json::to_value(PreflightWarning::InputMissing {
            path: "a.csv".to_string(),
        })
        .expect("serialize");
        assert_eq!(json["kind"], "input_missing");
        assert_eq!(json["path"], "a.csv");
    }
}
