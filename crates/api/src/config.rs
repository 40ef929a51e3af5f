use std::path::PathBuf;

use csvtx_supervisor::WorkerConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for running next to a local front-end.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for a stopped worker and background tasks
    /// (default: `10`).
    pub shutdown_timeout_secs: u64,
    /// Broadcast buffer size of the event bus (default: `1024`).
    pub event_bus_capacity: usize,
    /// Append every job event to this file when set.
    pub job_log_path: Option<PathBuf>,
    /// How the translation worker is launched.
    pub worker: WorkerConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `127.0.0.1`                |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `10`                       |
    /// | `EVENT_BUS_CAPACITY`    | `1024`                     |
    /// | `JOB_LOG_PATH`          | unset (no job log)         |
    ///
    /// Worker settings are read by [`WorkerConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let event_bus_capacity: usize = std::env::var("EVENT_BUS_CAPACITY")
            .unwrap_or_else(|_| csvtx_events::bus::DEFAULT_CAPACITY.to_string())
            .parse()
            .expect("EVENT_BUS_CAPACITY must be a valid usize");

        let job_log_path = std::env::var("JOB_LOG_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            event_bus_capacity,
            job_log_path,
            worker: WorkerConfig::from_env(),
        }
    }
}
