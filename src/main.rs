//! Ethereum Paper Trader - Entry Point
//!
//! Initializes configuration, logging, the market data gateway, the
//! decision oracle, and file-backed persistence, then serves an
//! interactive console on stdin. Runs until quit/EOF or SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Build adapters (DexScreener gateway, OpenAI oracle from OPENAI_API_KEY,
//!    file session store + JSONL trade journal)
//! 4. Preflight health probes (gateway reachable, store writable)
//! 5. Spawn Prometheus metrics server on :9090 (/metrics)
//! 6. Spawn health server on :8080 (/live + /ready)
//! 7. Spawn store health refresher (30s probe feeding /ready)
//! 8. Spawn config watcher (60s poll, watch channel)
//! 9. Run the console loop (start / end / status / portfolio / analyze / 0x…)
//! 10. quit, EOF, or SIGINT → graceful shutdown (drain tasks → exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::dexscreener::{DexScreenerClient, DexScreenerConfig};
use adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use adapters::oracle::{OpenAiConfig, OpenAiOracle};
use adapters::persistence::{FileSessionStore, FileTradeJournal};
use config::AppConfig;
use domain::{Ledger, Portfolio, Session, SimulationError};
use ports::market_data::MarketDataGateway;
use ports::session_store::SessionStore;
use usecases::{SessionLifecycle, TokenAnalyzer, TradeOrchestrator};

/// Fully wired use-case layer for one configuration generation.
///
/// Rebuilt wholesale when the config watcher reports a change; the
/// persisted session is untouched by a rebuild.
struct Simulator {
    lifecycle: SessionLifecycle<DexScreenerClient, FileSessionStore>,
    orchestrator:
        TradeOrchestrator<DexScreenerClient, OpenAiOracle, FileSessionStore, FileTradeJournal>,
    analyzer: TokenAnalyzer<DexScreenerClient, OpenAiOracle>,
    /// Kept out of the use cases for health probes.
    gateway: DexScreenerClient,
    store: FileSessionStore,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.simulation.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.simulation.name,
        version = env!("CARGO_PKG_VERSION"),
        session_key = %config.simulation.session_key,
        reference = %config.reference.symbol,
        "Starting paper trader"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Build adapters and use cases ─────────────────────
    let mut simulator = build_simulator(&config).await?;

    // ── 5. Preflight health probes ──────────────────────────
    let health_state = Arc::new(HealthState::new());
    if !simulator.gateway.is_healthy().await {
        warn!("Gateway preflight failed; trades will error until it recovers");
    }
    if !simulator.store.is_healthy().await {
        warn!("Session store preflight failed; check data_dir permissions");
        health_state.store_healthy.store(false, Ordering::Relaxed);
    }

    // ── 6. Spawn Prometheus metrics server ──────────────────
    let metrics =
        Arc::new(MetricsRegistry::new().context("Failed to build metrics registry")?);
    let metrics_handle = if config.metrics.enabled {
        let serve_metrics = Arc::clone(&metrics);
        let bind_address = config.metrics.bind_address.clone();
        let metrics_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = serve_metrics.serve(bind_address, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }))
    } else {
        None
    };

    // ── 7. Spawn health server ──────────────────────────────
    let health_server =
        HealthServer::new(Arc::clone(&health_state), config.metrics.health_port);
    let health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    // ── 8. Spawn store health refresher (30s probe) ─────────
    let probe_store = simulator.store.clone();
    let probe_state = Arc::clone(&health_state);
    let mut probe_shutdown = shutdown_tx.subscribe();
    let probe_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = probe_shutdown.recv() => break,
                _ = tokio::time::sleep(Duration::from_secs(30)) => {
                    let healthy = probe_store.is_healthy().await;
                    probe_state.store_healthy.store(healthy, Ordering::Relaxed);
                }
            }
        }
    });

    // ── 9. Spawn config watcher (60s poll) ──────────────────
    let (mut watcher, mut config_rx) =
        config::hot_reload::ConfigWatcher::new("config.toml", config.clone());
    let watcher_shutdown = shutdown_tx.subscribe();
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watcher.run(watcher_shutdown).await {
            error!(error = %e, "Config watcher failed");
        }
    });

    // ── 10. Console loop until quit/EOF or SIGINT ───────────
    run_console(&mut simulator, &mut config_rx, &metrics).await;

    // ── Graceful shutdown ───────────────────────────────────

    // 1. Signal all background tasks to stop
    let _ = shutdown_tx.send(());
    info!("Shutdown signal broadcast to all tasks");

    // 2. Readiness probe flips to 503 while tasks drain
    health_state.shutting_down.store(true, Ordering::Relaxed);

    // 3. Wait for background tasks (bounded)
    let _ = tokio::time::timeout(Duration::from_secs(5), watcher_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), probe_handle).await;
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), health_handle).await;

    info!("Shutdown complete");
    Ok(())
}

/// Construct the gateway, oracle, store, and journal from config and
/// wire them into the three use cases.
async fn build_simulator(config: &AppConfig) -> Result<Simulator> {
    let gateway_config = DexScreenerConfig {
        base_url: config.gateway.base_url.clone(),
        chain_ids: config.gateway.chain_ids.clone(),
        reference_address: config.reference.address.clone(),
        reference_pair_chain: config.reference.pair_chain.clone(),
        reference_pair_address: config.reference.pair_address.clone(),
        timeout: Duration::from_millis(config.gateway.timeout_ms),
        max_concurrent: config.gateway.max_concurrent,
        max_requests_per_minute: config.gateway.max_requests_per_minute,
    };
    let gateway = DexScreenerClient::new(gateway_config)
        .context("Failed to create DexScreener client")?;

    let oracle_config = OpenAiConfig {
        base_url: config.oracle.base_url.clone(),
        model: config.oracle.model.clone(),
        max_tokens: config.oracle.max_tokens,
        temperature: config.oracle.temperature,
        timeout: Duration::from_millis(config.oracle.timeout_ms),
    };
    let oracle = OpenAiOracle::from_env(oracle_config, config.reference.symbol.clone())
        .context("Failed to create OpenAI oracle")?;

    let store = FileSessionStore::new(&config.persistence.data_dir)
        .await
        .context("Failed to open session store")?;
    let journal = FileTradeJournal::new(&config.persistence.data_dir)
        .await
        .context("Failed to open trade journal")?;

    let seed_amount = Decimal::from_f64(config.simulation.seed_amount)
        .context("seed_amount is not representable as a decimal")?;
    let ledger = Ledger::new(
        &config.reference.address,
        &config.reference.symbol,
        seed_amount,
    );
    let session_key = config.simulation.session_key.clone();

    Ok(Simulator {
        lifecycle: SessionLifecycle::new(
            gateway.clone(),
            store.clone(),
            ledger.clone(),
            session_key.clone(),
        ),
        orchestrator: TradeOrchestrator::new(
            gateway.clone(),
            oracle.clone(),
            store.clone(),
            journal,
            ledger,
            session_key,
        ),
        analyzer: TokenAnalyzer::new(gateway.clone(), oracle),
        gateway,
        store,
    })
}

/// Interactive console: one command per line on stdin.
///
/// Rebuilds the simulator in place when the config watcher broadcasts
/// a change. Returns when the user quits, stdin closes, or SIGINT.
async fn run_console(
    simulator: &mut Simulator,
    config_rx: &mut watch::Receiver<AppConfig>,
    metrics: &Arc<MetricsRegistry>,
) {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    print_banner();

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("SIGINT received, initiating graceful shutdown");
                break;
            }
            changed = config_rx.changed() => {
                if changed.is_err() {
                    continue;
                }
                let new_config = config_rx.borrow_and_update().clone();
                match build_simulator(&new_config).await {
                    Ok(rebuilt) => {
                        *simulator = rebuilt;
                        info!("Adapters rebuilt from updated config");
                    }
                    Err(e) => {
                        error!(error = %e, "Config change rejected, keeping current wiring");
                    }
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(input)) => {
                        if !handle_command(simulator, metrics, input.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed, shutting down");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
        }
    }
}

/// Dispatch one console line. Returns false when the loop should exit.
async fn handle_command(
    simulator: &Simulator,
    metrics: &Arc<MetricsRegistry>,
    input: &str,
) -> bool {
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (input, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "" => {}
        "help" => print_banner(),
        "quit" | "exit" => return false,
        "start" => run_start(simulator, metrics).await,
        "end" => run_end(simulator, metrics).await,
        "status" => run_status(simulator).await,
        "portfolio" => run_portfolio(simulator).await,
        "analyze" => run_analyze(simulator, metrics, rest).await,
        // Anything else is treated as a token address to trade.
        _ => run_trade(simulator, metrics, input).await,
    }
    true
}

async fn run_start(simulator: &Simulator, metrics: &Arc<MetricsRegistry>) {
    match simulator.lifecycle.start().await {
        Ok(session) => {
            metrics.sessions_started.inc();
            metrics.session_active.set(1.0);
            metrics.portfolio_holdings.set(session.holding_count() as i64);
            println!("Session {} started.", session.id);
            print_portfolio_table(&session.portfolio);
        }
        Err(e) => print_failure("Start failed", &e),
    }
}

async fn run_end(simulator: &Simulator, metrics: &Arc<MetricsRegistry>) {
    match simulator.lifecycle.end().await {
        Ok(report) => {
            metrics.sessions_ended.inc();
            metrics.session_active.set(0.0);
            metrics.portfolio_holdings.set(0);
            metrics
                .session_pnl_usd
                .set(report.total_pnl_usd.to_f64().unwrap_or_default());
            println!("Session closed. Final report:");
            match serde_json::to_string_pretty(&report) {
                Ok(rendered) => println!("{rendered}"),
                Err(_) => println!("{report:?}"),
            }
        }
        Err(e) => print_failure("End failed", &e),
    }
}

async fn run_status(simulator: &Simulator) {
    match simulator.lifecycle.status().await {
        Ok(Some(session)) => print_session_summary(&session),
        Ok(None) => println!("No active session. Type 'start' to open one."),
        Err(e) => print_failure("Status failed", &e),
    }
}

async fn run_portfolio(simulator: &Simulator) {
    match simulator.lifecycle.status().await {
        Ok(Some(session)) => print_portfolio_table(&session.portfolio),
        Ok(None) => println!("No active session. Type 'start' to open one."),
        Err(e) => print_failure("Portfolio failed", &e),
    }
}

async fn run_analyze(simulator: &Simulator, metrics: &Arc<MetricsRegistry>, query: &str) {
    if query.is_empty() {
        println!("Usage: analyze <address or symbol>");
        return;
    }
    match simulator.analyzer.analyze(query).await {
        Ok(report) => {
            metrics
                .analyses_total
                .with_label_values(&[report.analysis.recommendation.as_str()])
                .inc();
            println!(
                "{} ({}) at ${}",
                report.snapshot.symbol, report.snapshot.address, report.snapshot.price_usd
            );
            println!("Overview:       {}", report.analysis.overview);
            println!(
                "Recommendation: {} (confidence {:.2})",
                report.analysis.recommendation, report.analysis.confidence
            );
            println!("Reasoning:      {}", report.analysis.reasoning);
            if !report.analysis.risks.is_empty() {
                println!("Risks:          {}", report.analysis.risks.join("; "));
            }
            if !report.analysis.opportunities.is_empty() {
                println!(
                    "Opportunities:  {}",
                    report.analysis.opportunities.join("; ")
                );
            }
        }
        Err(e) => print_failure("Analysis failed", &e),
    }
}

async fn run_trade(simulator: &Simulator, metrics: &Arc<MetricsRegistry>, identifier: &str) {
    let started = Instant::now();
    match simulator.orchestrator.execute_trade(identifier).await {
        Ok(outcome) => {
            metrics
                .trade_latency_seconds
                .observe(started.elapsed().as_secs_f64());
            metrics
                .trades_total
                .with_label_values(&[outcome.record.action.as_str()])
                .inc();
            metrics
                .portfolio_holdings
                .set(outcome.portfolio.len() as i64);
            println!(
                "{} {} {} at ${} ({})",
                outcome.record.action,
                outcome.record.amount,
                outcome.record.symbol,
                outcome.record.price_usd,
                outcome.decision.rationale,
            );
            print_portfolio_table(&outcome.portfolio);
        }
        Err(e) => {
            metrics.trade_failures.with_label_values(&[e.kind()]).inc();
            print_failure("Trade failed", &e);
        }
    }
}

/// Print a failed operation: statuses stay conversational, real errors
/// also land in the structured log with their kind.
fn print_failure(prefix: &str, e: &SimulationError) {
    if e.is_status() {
        println!("{e}");
    } else {
        error!(kind = e.kind(), error = %e, "{prefix}");
        println!("{prefix}: {e}");
    }
}

fn print_session_summary(session: &Session) {
    println!(
        "Session {} active since {} | {} holdings | {} trades",
        session.id,
        session.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        session.holding_count(),
        session.history.len(),
    );
}

fn print_portfolio_table(portfolio: &Portfolio) {
    if portfolio.is_empty() {
        println!("Portfolio is empty.");
        return;
    }
    println!("{:<12} {:>24} {:>20}", "SYMBOL", "AMOUNT", "AVG COST (USD)");
    for holding in portfolio.values() {
        println!(
            "{:<12} {:>24} {:>20}",
            holding.symbol, holding.amount, holding.average_cost
        );
    }
}

fn print_banner() {
    println!("Commands:");
    println!("  start              open a session seeded with the reference asset");
    println!("  0x<token address>  fetch market data and let the oracle trade it");
    println!("  analyze <query>    research a token without trading");
    println!("  status             show the active session");
    println!("  portfolio          show current holdings");
    println!("  end                close the session and print the PnL report");
    println!("  quit               exit");
}
