use crate::handlers::*;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Extender server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on
    pub listen_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8089)),
        }
    }
}

/// Build the extender router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(welcome))
        // Health checks
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Scheduler extender verbs
        .route("/predicates/ers", post(filter))
        .route("/bind/ers", post(bind))
        // Add tracing and state
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server for the scheduler extender
pub struct ExtenderServer {
    config: Config,
    state: Arc<AppState>,
}

impl ExtenderServer {
    pub fn new(config: Config, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Serve until `token` is cancelled
    pub async fn run(self, token: CancellationToken) -> Result<(), std::io::Error> {
        let app = build_router(self.state);

        info!("Starting scheduler extender on {}", self.config.listen_addr);

        let listener = TcpListener::bind(self.config.listen_addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(token.cancelled_owned())
            .await
    }
}
