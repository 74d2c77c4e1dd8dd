//! DexScreener Market Data Adapter
//!
//! Implements the `MarketDataGateway` port against the public DexScreener
//! REST API: token-to-pair resolution on the configured chains, reference
//! asset pricing via a fixed pool, and best-liquidity search for the
//! analyzer.
//!
//! Sub-modules:
//! - `client`: HTTP client with concurrency cap and request throttle
//! - `types`: API response type definitions and pair selection

pub mod client;
pub mod types;

pub use client::{DexScreenerClient, DexScreenerConfig};
