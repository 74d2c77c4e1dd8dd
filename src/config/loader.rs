//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::session::is_token_address;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    name = %config.simulation.name,
    session_key = %config.simulation.session_key,
    reference = %config.reference.symbol,
    chains = config.gateway.chain_ids.len(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - A well-formed session key (it becomes a file name)
/// - Positive seed amount
/// - Valid token addresses for the reference asset and its pair
/// - Sensible gateway and oracle limits
fn validate_config(config: &AppConfig) -> Result<()> {
  // Simulation validation
  anyhow::ensure!(
    !config.simulation.session_key.is_empty()
      && config
        .simulation
        .session_key
        .chars()
        .all(|c| c.is_ascii_alphanumeric()),
    "session_key must be non-empty alphanumeric, got {:?}",
    config.simulation.session_key
  );
  anyhow::ensure!(
    config.simulation.seed_amount.is_finite()
      && config.simulation.seed_amount > 0.0,
    "seed_amount must be positive, got {}",
    config.simulation.seed_amount
  );

  // Reference asset validation
  anyhow::ensure!(
    is_token_address(&config.reference.address),
    "reference address {:?} is not a 0x-prefixed 40-hex-digit address",
    config.reference.address
  );
  anyhow::ensure!(
    is_token_address(&config.reference.pair_address),
    "reference pair_address {:?} is not a 0x-prefixed 40-hex-digit address",
    config.reference.pair_address
  );
  anyhow::ensure!(
    !config.reference.symbol.is_empty(),
    "reference symbol must not be empty"
  );
  anyhow::ensure!(
    !config.reference.pair_chain.is_empty(),
    "reference pair_chain must not be empty"
  );

  // Gateway validation
  anyhow::ensure!(
    !config.gateway.base_url.is_empty(),
    "gateway base_url must not be empty"
  );
  anyhow::ensure!(
    !config.gateway.chain_ids.is_empty(),
    "gateway chain_ids must list at least one chain"
  );
  anyhow::ensure!(
    config.gateway.timeout_ms > 0,
    "gateway timeout_ms must be positive"
  );
  anyhow::ensure!(
    config.gateway.max_concurrent > 0,
    "gateway max_concurrent must be positive"
  );
  anyhow::ensure!(
    config.gateway.max_requests_per_minute > 0,
    "gateway max_requests_per_minute must be positive"
  );

  // Oracle validation
  anyhow::ensure!(
    !config.oracle.base_url.is_empty(),
    "oracle base_url must not be empty"
  );
  anyhow::ensure!(
    config.oracle.max_tokens > 0,
    "oracle max_tokens must be positive"
  );
  anyhow::ensure!(
    (0.0..=2.0).contains(&config.oracle.temperature),
    "oracle temperature must be in [0, 2], got {}",
    config.oracle.temperature
  );

  // Persistence validation
  anyhow::ensure!(
    !config.persistence.data_dir.is_empty(),
    "persistence data_dir must not be empty"
  );

  Ok(())
}
