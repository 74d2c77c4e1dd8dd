//! Configuration Module - TOML-based Simulator Configuration
//!
//! Loads and validates configuration from `config.toml`. All token
//! addresses, API endpoints, and simulation parameters are
//! externalized here - nothing is hardcoded in the domain layer.
//! The OpenAI API key is the one exception: it comes only from the
//! `OPENAI_API_KEY` environment variable, never from this file.

pub mod hot_reload;
pub mod loader;

use serde::Deserialize;

use crate::domain::{DEFAULT_REFERENCE_ADDRESS, DEFAULT_REFERENCE_PAIR};

/// Top-level simulator configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the simulator begins serving commands.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Simulation identity and session parameters.
  pub simulation: SimulationConfig,
  /// Reference asset definition (the portfolio's base currency).
  pub reference: ReferenceConfig,
  /// Market data gateway (DexScreener) parameters.
  pub gateway: GatewayConfig,
  /// Decision oracle (OpenAI) parameters.
  pub oracle: OracleConfig,
  /// Persistence configuration.
  pub persistence: PersistenceConfig,
  /// Metrics and monitoring.
  pub metrics: MetricsConfig,
}

/// Simulation identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
  /// Human-readable simulator name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Store key under which the active session is persisted.
  #[serde(default = "default_session_key")]
  pub session_key: String,
  /// Reference asset amount each new session is seeded with.
  #[serde(default = "default_seed_amount")]
  pub seed_amount: f64,
}

/// Reference asset configuration.
///
/// The reference asset is the session's base currency: every BUY is
/// paid from it and every SELL credits back into it. Defaults to
/// WETH on Ethereum mainnet.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
  /// Reference asset contract address.
  #[serde(default = "default_reference_address")]
  pub address: String,
  /// Reference asset display symbol.
  #[serde(default = "default_reference_symbol")]
  pub symbol: String,
  /// Chain of the pair used to price the reference asset in USD.
  #[serde(default = "default_pair_chain")]
  pub pair_chain: String,
  /// Address of the pair used to price the reference asset in USD.
  #[serde(default = "default_pair_address")]
  pub pair_address: String,
}

/// Market data gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
  /// DexScreener REST API base URL.
  #[serde(default = "default_gateway_url")]
  pub base_url: String,
  /// Chains a trade pair may live on, in preference order.
  #[serde(default = "default_chain_ids")]
  pub chain_ids: Vec<String>,
  /// Request timeout in milliseconds.
  #[serde(default = "default_gateway_timeout")]
  pub timeout_ms: u64,
  /// Maximum concurrent gateway requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Request budget per minute (public API etiquette).
  #[serde(default = "default_requests_per_minute")]
  pub max_requests_per_minute: u32,
}

/// Decision oracle configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
  /// Chat completions endpoint URL.
  #[serde(default = "default_oracle_url")]
  pub base_url: String,
  /// Model identifier sent with each completion request.
  #[serde(default = "default_model")]
  pub model: String,
  /// Completion token budget per request.
  #[serde(default = "default_max_tokens")]
  pub max_tokens: usize,
  /// Sampling temperature (0 = deterministic).
  #[serde(default = "default_temperature")]
  pub temperature: f64,
  /// Request timeout in milliseconds.
  #[serde(default = "default_oracle_timeout")]
  pub timeout_ms: u64,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Root directory for session snapshots and the trade journal.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_session_key() -> String {
  "simulationState".to_string()
}

fn default_seed_amount() -> f64 {
  10.0
}

fn default_reference_address() -> String {
  DEFAULT_REFERENCE_ADDRESS.to_string()
}

fn default_reference_symbol() -> String {
  "WETH".to_string()
}

fn default_pair_chain() -> String {
  "ethereum".to_string()
}

fn default_pair_address() -> String {
  DEFAULT_REFERENCE_PAIR.to_string()
}

fn default_gateway_url() -> String {
  "https://api.dexscreener.com".to_string()
}

fn default_chain_ids() -> Vec<String> {
  vec!["ethereum".to_string(), "ethereumpow".to_string()]
}

fn default_gateway_timeout() -> u64 {
  10_000
}

fn default_max_concurrent() -> usize {
  4
}

fn default_requests_per_minute() -> u32 {
  60
}

fn default_oracle_url() -> String {
  "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
  "gpt-4o".to_string()
}

fn default_max_tokens() -> usize {
  512
}

fn default_temperature() -> f64 {
  0.2
}

fn default_oracle_timeout() -> u64 {
  30_000
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_true() -> bool {
  true
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}
