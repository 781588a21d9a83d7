//! MCP Server builder utilities.
//!
//! Mounts an rmcp `ServerHandler` on the streamable HTTP transport behind the
//! bearer gate and serves it until a shutdown signal arrives.
//!
//! # Example
//!
//! ```ignore
//! use familyguy_mcp_common::{BearerAuth, HttpTransport, McpServerBuilder};
//!
//! McpServerBuilder::new(handler, BearerAuth::new(config.secret_token.clone()))
//!     .with_transport(HttpTransport::new(config.port))
//!     .run()
//!     .await?;
//! ```

use crate::auth::{BearerAuth, protect};
use crate::transport::HttpTransport;
use rmcp::ServerHandler;
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors that can occur when running an MCP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified port
    #[error("Failed to bind to port {port}: {message}")]
    BindFailed { port: u16, message: String },

    /// Transport error during communication
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Builder for configuring and running the authenticated MCP server.
pub struct McpServerBuilder<H> {
    handler: H,
    auth: BearerAuth,
    transport: HttpTransport,
    shutdown_rx: Option<oneshot::Receiver<()>>,
}

impl<H> McpServerBuilder<H>
where
    H: ServerHandler + Clone + Send + Sync + 'static,
{
    /// Create a new server builder. Every request is checked against `auth`.
    pub fn new(handler: H, auth: BearerAuth) -> Self {
        Self {
            handler,
            auth,
            transport: HttpTransport::default(),
            shutdown_rx: None,
        }
    }

    /// Set the listen address and mount path.
    pub fn with_transport(mut self, transport: HttpTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Set a shutdown signal receiver for graceful shutdown.
    ///
    /// When the sender is dropped or a message is sent, the server
    /// will initiate graceful shutdown.
    pub fn with_shutdown(mut self, shutdown_rx: oneshot::Receiver<()>) -> Self {
        self.shutdown_rx = Some(shutdown_rx);
        self
    }

    /// Build the protected axum router without binding a listener.
    pub fn router(&self) -> axum::Router {
        use rmcp::transport::streamable_http_server::{
            StreamableHttpService, session::local::LocalSessionManager,
        };

        let handler = self.handler.clone();
        let service = StreamableHttpService::new(
            move || Ok(handler.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // axum refuses to nest at the root.
        let router = if self.transport.path == "/" {
            axum::Router::new().fallback_service(service)
        } else {
            axum::Router::new().nest_service(&self.transport.path, service)
        };

        protect(router, self.auth.clone())
    }

    /// Run the MCP server.
    ///
    /// This method blocks until the server is shut down (via signal or shutdown channel).
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(transport = %self.transport, "Starting MCP server");

        let router = self.router();
        let port = self.transport.port;

        let tcp_listener = tokio::net::TcpListener::bind(self.transport.bind_addr())
            .await
            .map_err(|e| ServerError::BindFailed {
                port,
                message: e.to_string(),
            })?;

        tracing::info!(port, path = %self.transport.path, "HTTP server listening");

        let shutdown_rx = self.shutdown_rx;
        let shutdown_future = async move {
            if let Some(rx) = shutdown_rx {
                let _ = rx.await;
            } else {
                wait_for_shutdown_signal().await;
            }
            tracing::info!("Received shutdown signal, stopping server");
        };

        axum::serve(tcp_listener, router)
            .with_graceful_shutdown(shutdown_future)
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM");
                    }
                    _ = sigint.recv() => {
                        tracing::info!("Received SIGINT");
                    }
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to register signal handlers, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        }
        tracing::info!("Received Ctrl+C");
    }
}

/// Convenience function to set up graceful shutdown handling.
///
/// Returns a sender that can be used to trigger shutdown programmatically,
/// and a receiver to pass to the server builder.
pub fn shutdown_channel() -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
    oneshot::channel()
}
