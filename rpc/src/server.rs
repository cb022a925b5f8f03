//! Axum-based RPC server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use eggvote_node::{NodeMetrics, ShutdownController, VotingEngine};

use crate::error::RpcError;
use crate::handlers;

/// Shared state behind every handler.
pub struct RpcState {
    pub engine: Arc<VotingEngine>,
    pub metrics: Arc<NodeMetrics>,
}

/// The HTTP server, configured with a listen address and shared state.
pub struct RpcServer {
    pub listen: SocketAddr,
    pub cors_allow_any: bool,
    pub state: Arc<RpcState>,
}

impl RpcServer {
    pub fn new(
        listen: SocketAddr,
        cors_allow_any: bool,
        engine: Arc<VotingEngine>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            listen,
            cors_allow_any,
            state: Arc::new(RpcState { engine, metrics }),
        }
    }

    /// Build the router: all routes, the request-duration layer, and a
    /// permissive CORS layer when enabled.
    pub fn router(&self) -> Router {
        let mut app = Router::new()
            .route("/rounds/current", get(handlers::current_round))
            .route("/votes", post(handlers::cast_vote))
            .route("/votes/check", post(handlers::check_vote))
            .route("/auth/wallet", post(handlers::wallet_auth))
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::metrics))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                track_request_duration,
            ))
            .with_state(self.state.clone());

        if self.cors_allow_any {
            app = app.layer(CorsLayer::permissive());
        }
        app
    }

    /// Bind and serve until the shutdown controller fires.
    pub async fn serve(&self, shutdown: Arc<ShutdownController>) -> Result<(), RpcError> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.listen)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.listen)))?;
        tracing::info!(
            listen = %self.listen,
            cors_allow_any = self.cors_allow_any,
            "rpc server listening"
        );

        let mut shutdown_rx = shutdown.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        tracing::info!("rpc server stopped");
        Ok(())
    }
}

/// Times every request into the shared duration histogram.
async fn track_request_duration(
    State(state): State<Arc<RpcState>>,
    request: Request,
    next: Next,
) -> Response {
    let timer = state.metrics.request_duration_seconds.start_timer();
    let response = next.run(request).await;
    timer.observe_duration();
    response
}
