//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the simulator's core workflows. Each use case is a self-contained
//! operation driven by the console.
//!
//! Use cases:
//! - `TradeOrchestrator`: One decision cycle per token request
//! - `SessionLifecycle`: Start, End (PnL report), and Status
//! - `TokenAnalyzer`: Standalone research queries, read-only

pub mod session_lifecycle;
pub mod token_analyzer;
pub mod trade_orchestrator;

pub use session_lifecycle::SessionLifecycle;
pub use token_analyzer::{AnalysisReport, TokenAnalyzer};
pub use trade_orchestrator::{TradeOrchestrator, TradeOutcome};
