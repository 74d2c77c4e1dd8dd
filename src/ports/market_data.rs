//! Market Data Port - Token Pair Lookup Interface
//!
//! Defines the trait for read-only market data lookups against a DEX
//! aggregator (e.g., DexScreener REST). Every call is request/response;
//! there are no streaming feeds in the simulator.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::market::MarketSnapshot;
use crate::domain::session::TokenAddress;

/// Trait for market data providers.
///
/// Implementors resolve token identifiers to pair snapshots against the
/// configured reference asset. Failures surface immediately: the simulator
/// never retries a market lookup, a failed trade is simply reported to the
/// user.
#[async_trait]
pub trait MarketDataGateway: Send + Sync + 'static {
  /// Resolve a token address to its pair against the reference asset.
  ///
  /// Fails when the address resolves to no tradable reference-asset pair
  /// on the configured chains.
  async fn pair_snapshot(&self, address: &TokenAddress) -> anyhow::Result<MarketSnapshot>;

  /// Current USD price of the reference asset, read from the configured
  /// reference pair (e.g., the WETH/USDC pool).
  async fn reference_price(&self) -> anyhow::Result<Decimal>;

  /// Best pair by USD liquidity for a free-form query (an address or a
  /// bare symbol). Used by the standalone analyzer, not by trades.
  async fn token_overview(&self, query: &str) -> anyhow::Result<MarketSnapshot>;

  /// Check if the gateway endpoint is reachable. Used as a startup
  /// preflight, not on the trade path.
  async fn is_healthy(&self) -> bool;
}
