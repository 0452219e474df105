//! Observer server startup helper for embedding in the engine binary.
//!
//! Provides [`spawn_observer`] which launches the Observer HTTP +
//! `WebSocket` server on a background Tokio task so the API runs
//! concurrently with the simulators.
//!
//! # Usage
//!
//! ```rust,ignore
//! use plantsim_observer::startup::spawn_observer;
//!
//! let observer = spawn_observer("127.0.0.1:8080", state, stop.child_token()).await?;
//! // ... on shutdown:
//! stop.cancel();
//! observer.handle.await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::server::{ServerError, bind, start_server};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A running observer.
#[derive(Debug)]
pub struct ObserverHandle {
    /// Address the server is bound to.
    pub address: SocketAddr,
    /// Background task serving requests.
    pub handle: JoinHandle<()>,
}

/// Spawn the Observer HTTP server on a background Tokio task.
///
/// The address is bound eagerly, so a port already in use is reported
/// here rather than from inside the task. The server drains in-flight
/// requests and exits once `shutdown` is cancelled.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the server cannot bind to the
/// requested address.
pub async fn spawn_observer(
    address: &str,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> Result<ObserverHandle, StartupError> {
    let (listener, bound) = bind(address).await?;

    let handle = tokio::spawn(async move {
        let signal = async move { shutdown.cancelled().await };
        if let Err(e) = start_server(listener, state, signal).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%bound, "Observer server spawned on background task");

    Ok(ObserverHandle {
        address: bound,
        handle,
    })
}
