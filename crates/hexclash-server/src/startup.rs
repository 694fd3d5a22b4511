//! Server startup helper for embedding in the engine binary.
//!
//! Provides [`spawn_server`] which binds the listener eagerly and then
//! runs the HTTP + `WebSocket` server on a background Tokio task, so the
//! engine sees bind failures at startup while the tick loop runs
//! concurrently with the server.

use std::net::SocketAddr;
use std::sync::Arc;

use hexclash_core::config::ServerConfig;
use tokio::task::JoinHandle;

use crate::server::{self, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A server running on a background task.
#[derive(Debug)]
pub struct ServerHandle {
    /// The address actually bound (useful when the configured port is 0).
    pub addr: SocketAddr,
    /// The serving task.
    pub task: JoinHandle<()>,
}

/// Bind the configured address and serve on a background task.
///
/// The server runs until the Tokio runtime shuts down or the task is
/// aborted.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<ServerHandle, StartupError> {
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let task = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Server exited with error");
        }
    });

    tracing::info!(%addr, "Server spawned on background task");

    Ok(ServerHandle { addr, task })
}
