//! Viewer HTTP server: bounded port retry, axum router, graceful shutdown.

use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::store::LogStore;

use super::error::ServerError;
use super::handlers::{get_console_logs, get_events_sse, get_network_logs, get_status, AppState};

/// Default port for the viewer server.
pub const DEFAULT_PORT: u16 = 4000;

/// How many consecutive ports are tried when the preferred one is taken.
pub const PORT_RETRY_LIMIT: u16 = 64;

/// Configuration for the viewer server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Preferred port; successive ports are tried on conflict.
    pub port: u16,
    /// Whether to enable permissive CORS.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            cors_permissive: true,
        }
    }
}

/// Viewer HTTP server, not yet bound.
pub struct ViewerServer {
    config: ServerConfig,
    state: AppState,
    cancel: CancellationToken,
}

impl ViewerServer {
    /// Create a server over the given store with default configuration.
    #[must_use]
    pub fn new(
        store: Arc<LogStore>,
        watched_files: Arc<AtomicUsize>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config: ServerConfig::default(),
            state: AppState {
                store,
                watched_files,
            },
            cancel,
        }
    }

    /// Set the server configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the axum router with all routes and middleware.
    #[must_use]
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/api/console-logs", get(get_console_logs))
            .route("/api/network-logs", get(get_network_logs))
            .route("/api/events", get(get_events_sse))
            .route("/api/status", get(get_status))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Bind a listener, retrying successive ports while the preferred one
    /// is taken.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NoFreePort`] once the retry ceiling is hit,
    /// or the underlying I/O error for anything other than a port conflict.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let listener = bind_with_retry(&self.config.host, self.config.port).await?;
        let local_addr = listener.local_addr()?;
        let router = self.build_router();

        Ok(BoundServer {
            listener,
            router,
            cancel: self.cancel,
            local_addr,
        })
    }
}

/// A bound viewer server ready to serve, reporting its resolved address.
pub struct BoundServer {
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// The address actually bound, after any port retries.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL clients should connect to.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Serve until the cancellation token is triggered, then shut down
    /// gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails while serving.
    pub async fn serve(self) -> std::io::Result<()> {
        let cancel = self.cancel.clone();
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Viewer server shutting down gracefully");
            })
            .await
    }
}

async fn bind_with_retry(host: &str, preferred: u16) -> Result<TcpListener, ServerError> {
    let end = preferred.saturating_add(PORT_RETRY_LIMIT - 1);
    for port in preferred..=end {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => {
                if port != preferred {
                    tracing::info!(preferred, port, "Preferred port taken, bound to fallback");
                }
                return Ok(listener);
            }
            Err(error) if error.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port in use, trying next");
            }
            Err(error) => return Err(ServerError::Io(error)),
        }
    }

    Err(ServerError::NoFreePort {
        start: preferred,
        end,
    })
}
