//! Prometheus Metrics Registry - Simulation Observability
//!
//! Registers and exposes Prometheus metrics on :9090 for Grafana
//! dashboards. Covers session lifecycle, trade throughput, failure
//! reasons, decision latency, and closing PnL.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Centralized Prometheus metrics for the paper trader.
///
/// All metrics follow the naming convention `paper_trader_*`. Trade
/// counters carry an `action` label, failures a `reason` label.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Total sessions started counter.
    pub sessions_started: IntCounter,
    /// Total sessions ended counter.
    pub sessions_ended: IntCounter,
    /// Whether a session is active (1 = active, 0 = idle).
    pub session_active: prometheus::Gauge,
    /// Number of holdings in the active portfolio.
    pub portfolio_holdings: prometheus::IntGauge,
    /// Total executed trades counter (BUY/SELL/HOLD).
    pub trades_total: IntCounterVec,
    /// Total failed trade requests counter, by failure reason.
    pub trade_failures: IntCounterVec,
    /// End-to-end trade latency histogram (fetch + decide + apply).
    pub trade_latency_seconds: Histogram,
    /// Total token analyses counter, by recommendation.
    pub analyses_total: IntCounterVec,
    /// Total PnL of the most recently closed session (USD).
    pub session_pnl_usd: prometheus::Gauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let sessions_started = IntCounter::new(
            "paper_trader_sessions_started_total",
            "Total simulation sessions started",
        )?;

        let sessions_ended = IntCounter::new(
            "paper_trader_sessions_ended_total",
            "Total simulation sessions ended",
        )?;

        let session_active = prometheus::Gauge::new(
            "paper_trader_session_active",
            "Whether a simulation session is active (1=yes, 0=no)",
        )?;

        let portfolio_holdings = prometheus::IntGauge::new(
            "paper_trader_portfolio_holdings",
            "Number of holdings in the active portfolio",
        )?;

        let trades_total = IntCounterVec::new(
            Opts::new("paper_trader_trades_total", "Total executed trades"),
            &["action"],
        )?;

        let trade_failures = IntCounterVec::new(
            Opts::new(
                "paper_trader_trade_failures_total",
                "Total failed trade requests",
            ),
            &["reason"],
        )?;

        let trade_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "paper_trader_trade_latency_seconds",
                "End-to-end trade latency in seconds",
            )
            .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        let analyses_total = IntCounterVec::new(
            Opts::new(
                "paper_trader_analyses_total",
                "Total token analyses served",
            ),
            &["recommendation"],
        )?;

        let session_pnl_usd = prometheus::Gauge::new(
            "paper_trader_session_pnl_usd",
            "Total PnL of the most recently closed session in USD",
        )?;

        // Register all metrics
        registry.register(Box::new(sessions_started.clone()))?;
        registry.register(Box::new(sessions_ended.clone()))?;
        registry.register(Box::new(session_active.clone()))?;
        registry.register(Box::new(portfolio_holdings.clone()))?;
        registry.register(Box::new(trades_total.clone()))?;
        registry.register(Box::new(trade_failures.clone()))?;
        registry.register(Box::new(trade_latency_seconds.clone()))?;
        registry.register(Box::new(analyses_total.clone()))?;
        registry.register(Box::new(session_pnl_usd.clone()))?;

        Ok(Self {
            registry,
            sessions_started,
            sessions_ended,
            session_active,
            portfolio_holdings,
            trades_total,
            trade_failures,
            trade_latency_seconds,
            analyses_total,
            session_pnl_usd,
        })
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let registry = metrics_self.registry.clone();
                async move {
                    let encoder = TextEncoder::new();
                    let metric_families = registry.gather();
                    let mut buffer = Vec::new();
                    let _ = encoder.encode(&metric_families, &mut buffer);
                    String::from_utf8(buffer).unwrap_or_default()
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
