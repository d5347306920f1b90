//! Server startup helper.
//!
//! Provides [`spawn_api_server`] which launches the API server on a
//! background Tokio task, so the binary can run the dashboard server on
//! its main task.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::router::build_api_router;
use crate::server::{ServerConfig, ServerError, start_server};
use crate::state::AppState;

/// Errors that can occur when spawning a server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the API server on a background Tokio task.
///
/// Binds to `host:api_port` from the state's configuration. Returns a
/// [`JoinHandle`] that resolves once the server has stopped, which
/// happens when `shutdown` resolves or serving fails.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the configured address is not
/// valid. This is checked before the background task is spawned; bind
/// failures are logged from inside the task.
pub fn spawn_api_server(
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<()>, StartupError> {
    let config = ServerConfig {
        name: "api",
        host: state.config.run_details.host.clone(),
        port: state.config.api_port(),
    };
    config.socket_addr()?;

    let router = build_api_router(state);
    let port = config.port;
    let handle = tokio::spawn(async move {
        if let Err(e) = start_server(&config, router, shutdown).await {
            tracing::error!(error = %e, "API server exited with error");
        }
    });

    tracing::info!(port, "API server spawned on background task");

    Ok(handle)
}
