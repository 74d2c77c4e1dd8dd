//! Health Check Server - Liveness and Readiness Probes
//!
//! Exposes /live and /ready endpoints via axum 0.7 for Docker
//! health checks and monitoring. Readiness depends on session store
//! writability (refreshed by a background probe) and flips to 503
//! for good once graceful shutdown begins.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Whether the session store directory answered its last probe.
    pub store_healthy: Arc<std::sync::atomic::AtomicBool>,
    /// Set once at the start of graceful shutdown, never cleared.
    pub shutting_down: Arc<std::sync::atomic::AtomicBool>,
}

impl HealthState {
    /// Create a new health state (healthy, not shutting down).
    pub fn new() -> Self {
        Self {
            store_healthy: Arc::new(std::sync::atomic::AtomicBool::new(true)),
            shutting_down: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Check if the system is ready to serve traffic.
    pub fn is_ready(&self) -> bool {
        use std::sync::atomic::Ordering;
        self.store_healthy.load(Ordering::Relaxed)
            && !self.shutting_down.load(Ordering::Relaxed)
    }
}

/// Axum-based health check HTTP server.
///
/// Serves liveness (/live) and readiness (/ready) endpoints for
/// Docker health checks and orchestrator probes.
pub struct HealthServer {
    /// Health state shared with all components.
    state: Arc<HealthState>,
    /// Bind port (default 8080 from config).
    port: u16,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(state: Arc<HealthState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Start the health check server in the background.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(
        self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .with_state(Arc::clone(&self.state));

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: 200 while the store is healthy and no shutdown
    /// has begun.
    async fn readiness(
        State(state): State<Arc<HealthState>>,
    ) -> impl IntoResponse {
        if state.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}
