//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `MarketDataGateway`: Token pair lookups (DEX aggregator REST)
//! - `DecisionOracle`: LLM completions for decisions and analyses
//! - `SessionStore`: Durable single-slot session persistence
//! - `TradeJournal`: Append-only trade audit trail (JSONL-based)

pub mod journal;
pub mod market_data;
pub mod oracle;
pub mod session_store;
