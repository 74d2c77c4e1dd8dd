//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, file I/O). Each sub-module
//! groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `dexscreener`: DEX Screener REST market data client
//! - `oracle`: OpenAI chat completion decision oracle
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: Session snapshots and JSONL trade journal

pub mod dexscreener;
pub mod metrics;
pub mod oracle;
pub mod persistence;
