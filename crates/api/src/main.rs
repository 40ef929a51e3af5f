use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use csvtx_core::types::JobId;
use csvtx_events::{EventBus, JobEventKind, JobLogWriter, Subscription};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use csvtx_api::config::ServerConfig;
use csvtx_api::router::build_app_router;
use csvtx_api::state::AppState;
use csvtx_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "csvtx_api=debug,csvtx_supervisor=debug,csvtx_events=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        worker = %config.worker.program,
        script = %config.worker.script_path,
        "Loaded server configuration"
    );
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::new(config.event_bus_capacity));
    tracing::info!(capacity = config.event_bus_capacity, "Event bus created");

    // Optional on-disk job log.
    let log_handle = match &config.job_log_path {
        Some(path) => match JobLogWriter::open(path).await {
            Ok(writer) => Some(tokio::spawn(writer.run(event_bus.subscribe()))),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %path.display(),
                    "Cannot open job log, continuing without it"
                );
                None
            }
        },
        None => None,
    };

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));
    let forwarder_handle = tokio::spawn(
        ws::EventForwarder::new(Arc::clone(&ws_manager)).run(event_bus.subscribe()),
    );

    // --- App state ---
    let state = AppState::new(
        config.clone(),
        Arc::clone(&event_bus),
        Arc::clone(&ws_manager),
    );
    let supervisor = Arc::clone(&state.supervisor);

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let shutdown_ws = Arc::clone(&ws_manager);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open sockets would otherwise hold the graceful drain forever.
            let ws_count = shutdown_ws.connection_count().await;
            tracing::info!(ws_count, "Closing WebSocket connections");
            shutdown_ws.shutdown_all().await;
        })
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // A worker must not outlive the server.
    let terminal = event_bus.subscribe();
    let stop = supervisor.stop();
    if let Some(job_id) = stop.job_id {
        tracing::info!(job_id, "Stopping running translation job");
        if tokio::time::timeout(shutdown_timeout, wait_for_terminal(terminal, job_id))
            .await
            .is_err()
        {
            tracing::warn!(job_id, "Worker did not exit before shutdown timeout");
        }
    }
    drop(supervisor);

    // Drop the last bus handle to close the broadcast channel; this lets the
    // forwarder and job log drain and exit.
    drop(event_bus);
    let _ = tokio::time::timeout(shutdown_timeout, forwarder_handle).await;
    if let Some(handle) = log_handle {
        let _ = tokio::time::timeout(shutdown_timeout, handle).await;
    }
    tracing::info!("Event services shut down");

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait until `job_id` publishes its terminal event (or the bus closes).
async fn wait_for_terminal(mut subscription: Subscription, job_id: JobId) {
    while let Some(event) = subscription.next().await {
        if event.job_id == job_id && event.is_terminal() {
            if let JobEventKind::Failed { exit_code, .. } = event.kind {
                tracing::info!(job_id, exit_code, "Translation worker exited during shutdown");
            }
            return;
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
