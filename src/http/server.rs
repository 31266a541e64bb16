//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router (every path goes to the gateway handler)
//! - Wire up middleware (tracing)
//! - Bind and serve, plain or TLS
//! - Stop accepting on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Router};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::backend::{ChatBackend, WorkerPool};
use crate::config::{GatewayConfig, GatewayPolicy, ServerConfig};
use crate::http::websocket::gateway_handler;
use crate::lifecycle::shutdown;
use crate::net::ConnectionLimiter;

/// Grace period for TLS connections to finish after shutdown.
const TLS_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Bind address could not be parsed.
    #[error("Invalid bind address '{0}'")]
    Address(String),
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(std::io::Error),
    /// Serving failed after bind.
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Bind the configured address.
pub async fn bind_listener(config: &ServerConfig) -> Result<TcpListener, ListenerError> {
    let bind = config.bind_address();
    let addr: SocketAddr = bind.parse().map_err(|_| ListenerError::Address(bind))?;

    let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
    let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

    tracing::info!(
        address = %local_addr,
        max_connections = config.max_connections,
        "Listener bound"
    );
    Ok(listener)
}

/// Shared state injected into handlers and sessions.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<GatewayPolicy>,
    pub backend: Arc<dyn ChatBackend>,
    pub pool: WorkerPool,
    pub limiter: ConnectionLimiter,
}

/// WebSocket gateway server.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Create a server that answers with the given backend.
    pub fn new(config: GatewayConfig, backend: Arc<dyn ChatBackend>) -> Self {
        let state = AppState {
            policy: Arc::new(config.gateway.policy()),
            backend,
            pool: WorkerPool::new(config.gateway.worker_pool_size),
            limiter: ConnectionLimiter::new(config.server.max_connections),
        };

        tracing::info!(
            require_device_id = state.policy.require_device_id,
            allowed_devices = state.policy.allowed_devices.len(),
            worker_pool_size = state.pool.size(),
            "Gateway policy loaded"
        );

        let router = Self::build_router(state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve plain HTTP/WS until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(address = %addr, "Gateway listening");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await
            .map_err(ListenerError::Serve)?;

        self.state.pool.close();
        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// Serve HTTPS/WSS until `shutdown` fires.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(address = %addr, "Gateway listening (TLS)");

        let handle = axum_server::Handle::new();
        let signal_handle = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown_rx).await;
            signal_handle.graceful_shutdown(Some(TLS_SHUTDOWN_GRACE));
        });

        let std_listener = listener.into_std().map_err(ListenerError::Bind)?;
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(std_listener, tls)
            .handle(handle)
            .serve(app)
            .await
            .map_err(ListenerError::Serve)?;

        self.state.pool.close();
        tracing::info!("Gateway stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Sessions currently open.
    pub fn active_sessions(&self) -> usize {
        self.state.limiter.active_count()
    }
}
