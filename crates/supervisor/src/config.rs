use std::path::PathBuf;
use std::time::Duration;

use csvtx_core::progress::{BracketCounterParser, DEFAULT_COMPLETION_MARKERS};

/// How the worker process is launched.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Interpreter executable, resolved through `PATH`.
    pub program: String,
    /// Worker script, passed as the first argument to `program`.
    pub script_path: String,
    /// Working directory for the worker (inherits ours if `None`).
    pub working_directory: Option<PathBuf>,
    /// Extra environment variables set for the worker.
    pub env_vars: Vec<(String, String)>,
    /// Phrases that mark the worker as done, for progress inference.
    pub completion_markers: Vec<String>,
    /// How long a stopped worker gets to exit after SIGTERM before it is
    /// killed outright.
    pub kill_grace: Duration,
}

impl WorkerConfig {
    /// Config for `program script_path ...` with default environment and
    /// progress markers.
    pub fn new(program: impl Into<String>, script_path: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            script_path: script_path.into(),
            working_directory: None,
            env_vars: default_env_vars(),
            completion_markers: DEFAULT_COMPLETION_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            kill_grace: Duration::from_secs(10),
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                              |
    /// |-------------------------------|--------------------------------------|
    /// | `WORKER_PROGRAM`              | `python3`                            |
    /// | `WORKER_SCRIPT`               | `translate_csv.py`                   |
    /// | `WORKER_WORKDIR`              | unset                                |
    /// | `PROGRESS_COMPLETION_MARKERS` | `翻译完成,translation complete`      |
    /// | `WORKER_KILL_GRACE_SECS`      | `10`                                 |
    pub fn from_env() -> Self {
        let program = std::env::var("WORKER_PROGRAM").unwrap_or_else(|_| "python3".into());
        let script_path =
            std::env::var("WORKER_SCRIPT").unwrap_or_else(|_| "translate_csv.py".into());

        let mut config = Self::new(program, script_path);

        config.working_directory = std::env::var("WORKER_WORKDIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if let Ok(markers) = std::env::var("PROGRESS_COMPLETION_MARKERS") {
            config.completion_markers = parse_markers(&markers);
        }

        let kill_grace_secs: u64 = std::env::var("WORKER_KILL_GRACE_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("WORKER_KILL_GRACE_SECS must be a valid u64");
        config.kill_grace = Duration::from_secs(kill_grace_secs);

        config
    }

    /// The progress parser matching this config's completion markers.
    pub fn progress_parser(&self) -> BracketCounterParser {
        BracketCounterParser::new(&self.completion_markers)
    }
}

/// Unbuffered, UTF-8 output so a Python worker streams progress live.
fn default_env_vars() -> Vec<(String, String)> {
    vec![
        ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
        ("PYTHONIOENCODING".to_string(), "utf-8".to_string()),
    ]
}

fn parse_markers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
