//! HTTP server module exposing the live monitoring status.

mod connections;
mod events;
mod status;

use std::{io, net::SocketAddr, sync::Arc};

use axum::{Router, routing::get};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use connections::ConnectionRegistry;

use crate::{metrics::MetricsStore, monitor::ErrorWindow};

/// Custom error type for the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured listen address could not be parsed.
    #[error("Invalid listen address '{address}': {source}")]
    InvalidAddress {
        /// The address as configured.
        address: String,
        /// The underlying parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Binding the listener or serving requests failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Shared state available to every handler.
#[derive(Clone)]
pub struct ApiState {
    /// The monitoring metrics store.
    pub metrics: Arc<MetricsStore>,
    /// Error accounting feeding the 24h counter.
    pub error_window: Arc<ErrorWindow>,
    /// Registry of open status streams.
    pub connections: Arc<ConnectionRegistry>,
    /// Signals shutdown to the server and to every open stream.
    pub shutdown: CancellationToken,
}

/// Builds the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(status::status))
        .route("/events", get(events::events))
        .with_state(state)
}

/// Runs the HTTP server until the shutdown token fires.
pub async fn run_server(listen_address: &str, state: ApiState) -> Result<(), ServerError> {
    let addr: SocketAddr =
        listen_address.parse().map_err(|source| ServerError::InvalidAddress {
            address: listen_address.to_string(),
            source,
        })?;
    let shutdown = state.shutdown.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Status server listening.");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    tracing::info!("Status server has shut down.");
    Ok(())
}
