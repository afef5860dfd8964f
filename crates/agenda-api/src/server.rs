//! HTTP server lifecycle.
//!
//! [`start_server`] binds the configured address and serves the router
//! until `Ctrl-C`, then drains in-flight requests before returning.

use std::net::SocketAddr;
use std::sync::Arc;

use agenda_core::ServerConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Errors that stop the server from starting or keep it from running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `host:port` from the configuration is not a socket address.
    #[error("invalid listen address {addr}: {source}")]
    Address {
        /// The rejected `host:port` string.
        addr: String,
        /// Parser error.
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// OS error.
        source: std::io::Error,
    },

    /// Accepting or serving connections failed.
    #[error("server stopped abnormally: {0}")]
    Serve(#[source] std::io::Error),
}

/// Serve the Agenda API on `config.host:config.port`.
///
/// Returns `Ok(())` once a `Ctrl-C` shutdown has drained.
///
/// # Errors
///
/// See [`ServerError`].
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let requested = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = requested
        .parse()
        .map_err(|source| ServerError::Address {
            addr: requested.clone(),
            source,
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Agenda API listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Agenda API stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C; shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unparsable_host_is_reported_before_binding() {
        let config = ServerConfig {
            host: "not a host".to_owned(),
            port: 5000,
        };
        let state = Arc::new(AppState::new(agenda_core::Scheduler::new()));
        let result = start_server(&config, state).await;
        assert!(matches!(
            result,
            Err(ServerError::Address { ref addr, .. }) if addr == "not a host:5000"
        ));
    }
}
