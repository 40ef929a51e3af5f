use std::sync::Arc;

use csvtx_events::EventBus;
use csvtx_supervisor::JobSupervisor;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// The single-slot worker supervisor.
    pub supervisor: Arc<JobSupervisor>,
    /// Bus the supervisor publishes job events on.
    pub event_bus: Arc<EventBus>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
}

impl AppState {
    /// Wire a supervisor to `event_bus` using the worker settings in `config`.
    pub fn new(config: ServerConfig, event_bus: Arc<EventBus>, ws_manager: Arc<WsManager>) -> Self {
        let supervisor = Arc::new(JobSupervisor::new(
            config.worker.clone(),
            Arc::clone(&event_bus),
        ));
        Self {
            config: Arc::new(config),
            supervisor,
            event_bus,
            ws_manager,
        }
    }
}
