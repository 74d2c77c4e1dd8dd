//! Config Hot-Reload - Watch config.toml for Changes
//!
//! Periodically re-reads config.toml and compares it with the last
//! known contents. When a change is detected, the file is reloaded,
//! revalidated, and broadcast via a `tokio::sync::watch` channel.
//! The console loop subscribes and rebuilds its adapter wiring
//! without restarting the simulator.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use super::AppConfig;

/// How often the config file is polled for changes.
const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Watches config.toml for changes and broadcasts updates.
///
/// Polls the config file on a fixed interval (not a filesystem
/// watcher, which has portability issues across Linux/macOS/Docker
/// volumes). Compares a content hash to detect meaningful changes.
pub struct ConfigWatcher {
    /// Path to config.toml.
    config_path: String,
    /// Watch channel sender for config updates.
    config_tx: watch::Sender<AppConfig>,
    /// Hash of the last accepted file contents.
    last_hash: Option<u64>,
}

impl ConfigWatcher {
    /// Create a new config watcher.
    ///
    /// Returns the watcher and a watch::Receiver that consumers
    /// can use to get notified of config changes.
    pub fn new(
        config_path: &str,
        initial_config: AppConfig,
    ) -> (Self, watch::Receiver<AppConfig>) {
        let (config_tx, config_rx) = watch::channel(initial_config);

        let watcher = Self {
            config_path: config_path.to_string(),
            config_tx,
            last_hash: None,
        };

        (watcher, config_rx)
    }

    /// Run the config watcher loop.
    ///
    /// Checks config.toml every poll interval. On change, reloads
    /// and broadcasts the new config. Runs until shutdown.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(
        &mut self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        info!(
            path = %self.config_path,
            interval_secs = POLL_INTERVAL.as_secs(),
            "Config watcher started"
        );

        // Baseline hash so an unchanged file never triggers a reload
        self.last_hash = self.compute_hash().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Config watcher shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {
                    self.check_and_reload().await;
                }
            }
        }
    }

    /// Check if config has changed and reload if so.
    async fn check_and_reload(&mut self) {
        let new_hash = self.compute_hash().await;

        if new_hash == self.last_hash {
            debug!("Config unchanged");
            return;
        }

        info!("Config change detected, reloading");

        match super::loader::load_config(&self.config_path) {
            Ok(new_config) => {
                self.last_hash = new_hash;
                if self.config_tx.send(new_config).is_err() {
                    warn!("No config subscribers, update dropped");
                } else {
                    info!("Config reloaded successfully");
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Failed to reload config, keeping current"
                );
            }
        }
    }

    /// Hash the config file contents for cheap diff detection.
    async fn compute_hash(&self) -> Option<u64> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let content = tokio::fs::read_to_string(&self.config_path)
            .await
            .ok()?;

        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Some(hasher.finish())
    }
}
