//! Decision Oracle Port - LLM Completion Interface
//!
//! Defines the trait for the model that turns market data into trading
//! decisions. The oracle is a black box: inputs are structured snapshots,
//! output is a raw text blob that the domain parses and validates. The
//! oracle's reply is never trusted as-is.

use async_trait::async_trait;

use crate::domain::market::MarketSnapshot;
use crate::domain::session::Portfolio;

/// Trait for decision oracle providers.
///
/// One attempt per request; a transport failure or unusable reply surfaces
/// as an invalid decision to the caller rather than being retried.
#[async_trait]
pub trait DecisionOracle: Send + Sync + 'static {
  /// Ask for a BUY/SELL/HOLD decision on the given pair, in the context of
  /// the current portfolio. Returns the raw completion text.
  async fn trade_decision(
    &self,
    snapshot: &MarketSnapshot,
    portfolio: &Portfolio,
  ) -> anyhow::Result<String>;

  /// Ask for a standalone structured analysis of a token. Returns the raw
  /// completion text.
  async fn token_analysis(&self, snapshot: &MarketSnapshot) -> anyhow::Result<String>;
}
