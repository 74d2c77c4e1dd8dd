//! File Session Store - Atomic JSON Session Persistence
//!
//! Saves the active session to `sessions/{key}.json` using atomic writes
//! (write to tmp file, then rename). This guarantees crash safety and
//! prevents partial writes from corrupting the stored session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{info, instrument};

use crate::domain::session::Session;
use crate::ports::session_store::SessionStore;

/// Atomic JSON store for the single active session.
///
/// Each key owns one file; a write lands in a temporary file first and is
/// atomically renamed into place, so the stored session is always either
/// the old or the new version, never a torn write.
#[derive(Clone)]
pub struct FileSessionStore {
    /// Directory holding `{key}.json` files.
    sessions_dir: PathBuf,
}

impl FileSessionStore {
    /// Create a new session store in the given data directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let sessions_dir = Path::new(data_dir).join("sessions");
        fs::create_dir_all(&sessions_dir)
            .await
            .context("Failed to create sessions directory")?;
        Ok(Self { sessions_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.sessions_dir.join(format!("{key}.json"))
    }

    fn tmp_for(&self, key: &str) -> PathBuf {
        self.sessions_dir.join(format!("{key}.json.tmp"))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Session>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .await
            .context("Failed to read session file")?;
        let session: Session =
            serde_json::from_str(&json).context("Failed to parse session JSON")?;
        Ok(Some(session))
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn set(&self, key: &str, session: &Session) -> Result<()> {
        let json =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        // Write to tmp file, then atomic rename.
        let tmp = self.tmp_for(key);
        fs::write(&tmp, &json)
            .await
            .context("Failed to write tmp session file")?;
        fs::rename(&tmp, self.path_for(key))
            .await
            .context("Failed to rename session file")?;

        info!(
            holdings = session.portfolio.len(),
            trades = session.history.len(),
            "Session saved"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => {
                info!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete session file"),
        }
    }

    async fn is_healthy(&self) -> bool {
        let probe = self.sessions_dir.join(".health_check");
        let result = fs::write(&probe, b"ok").await;
        let _ = fs::remove_file(&probe).await;
        result.is_ok()
    }
}
