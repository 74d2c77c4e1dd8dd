//! Domain layer - Core simulation logic and models.
//!
//! This module contains the pure domain logic for the paper-trading
//! simulator. No external I/O allowed here (hexagonal architecture inner
//! ring). All types are serializable and testable in isolation.

pub mod decision;
pub mod error;
pub mod ledger;
pub mod market;
pub mod session;

// Re-export core types for convenience
pub use decision::{TokenAnalysis, TradeDecision};
pub use error::SimulationError;
pub use ledger::{HoldingReport, Ledger, PnlReport};
pub use market::MarketSnapshot;
pub use session::{
    Holding, LivePriceMap, Portfolio, Session, TokenAddress, TradeAction, TradeRecord,
    DEFAULT_REFERENCE_ADDRESS, DEFAULT_REFERENCE_PAIR, DEFAULT_REFERENCE_SYMBOL,
};
