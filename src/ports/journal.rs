//! Trade Journal Port - Append-Only Audit Trail Interface
//!
//! Defines the trait for the durable audit log of executed trades. The
//! journal is a convenience mirror of the in-session history: it survives
//! session end and never participates in PnL math.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::session::TradeRecord;

/// One journaled trade, self-contained for line-oriented storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
  /// Session the trade belongs to.
  pub session_id: Uuid,
  /// The executed trade.
  #[serde(flatten)]
  pub trade: TradeRecord,
}

/// Trait for trade journal providers.
///
/// Append failures are non-fatal to the trade that produced them (the
/// session history already carries the record), so callers log and move on.
#[async_trait]
pub trait TradeJournal: Send + Sync + 'static {
  /// Append one record to durable storage.
  async fn append(&self, record: &JournalRecord) -> anyhow::Result<()>;

  /// Load every journaled record, oldest first. Malformed lines are
  /// skipped, not fatal.
  async fn load_all(&self) -> anyhow::Result<Vec<JournalRecord>>;
}
