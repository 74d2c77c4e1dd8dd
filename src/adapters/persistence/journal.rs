//! File Trade Journal - Append-only JSONL Trade Records
//!
//! Persists executed trades to daily JSONL files in the format
//! `journal/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON record
//! for easy parsing, streaming, and post-session analysis.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::ports::journal::{JournalRecord, TradeJournal};

/// Append-only JSONL journal with daily file rotation.
///
/// Files are named `journal/YYYY-MM-DD.jsonl` and each line is a complete
/// JSON object. The format is optimized for:
/// - Append-only writes (no read-modify-write)
/// - Line-by-line streaming for analysis
/// - Natural daily partitioning
#[derive(Clone)]
pub struct FileTradeJournal {
    /// Base directory for journal files.
    journal_dir: PathBuf,
}

impl FileTradeJournal {
    /// Create a new journal in the given data directory.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let journal_dir = Path::new(data_dir).join("journal");
        fs::create_dir_all(&journal_dir)
            .await
            .context("Failed to create journal directory")?;
        Ok(Self { journal_dir })
    }
}

#[async_trait]
impl TradeJournal for FileTradeJournal {
    #[instrument(skip(self, record), fields(session_id = %record.session_id))]
    async fn append(&self, record: &JournalRecord) -> Result<()> {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let path = self.journal_dir.join(format!("{date}.jsonl"));

        let mut json =
            serde_json::to_string(record).context("Failed to serialize journal record")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open journal file")?;
        file.write_all(json.as_bytes())
            .await
            .context("Failed to write journal record")?;
        file.flush().await.context("Failed to flush journal")?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_all(&self) -> Result<Vec<JournalRecord>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.journal_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                let content = fs::read_to_string(&path).await?;
                for line in content.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<JournalRecord>(line) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            warn!(
                                file = %path.display(),
                                error = %e,
                                "Skipping malformed journal record"
                            );
                        }
                    }
                }
            }
        }

        records.sort_by_key(|r| r.trade.executed_at);
        info!(count = records.len(), "Loaded journal records");
        Ok(records)
    }
}
