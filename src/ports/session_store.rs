//! Session Store Port - Durable Session Slot Interface
//!
//! Defines the trait for the key-value slot that holds at most one active
//! session between operations. The store is the single source of truth:
//! usecases load before every mutation and never cache a session across
//! calls.

use async_trait::async_trait;

use crate::domain::session::Session;

/// Trait for session persistence providers.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
  /// Load the session stored under `key`, if any.
  async fn get(&self, key: &str) -> anyhow::Result<Option<Session>>;

  /// Persist `session` under `key`, replacing any previous value. Must be
  /// atomic: a crash mid-write may lose the update but never corrupts the
  /// stored state.
  async fn set(&self, key: &str, session: &Session) -> anyhow::Result<()>;

  /// Remove the session under `key`. Removing an absent key is a no-op.
  async fn delete(&self, key: &str) -> anyhow::Result<()>;

  /// Check if the backing storage is usable (readiness probe input).
  async fn is_healthy(&self) -> bool;
}
