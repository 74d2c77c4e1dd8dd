//! Persistence Adapters - JSONL-based File Storage
//!
//! Implements the SessionStore and TradeJournal ports using atomic JSON
//! files for session state and append-only JSONL files for the trade
//! audit trail. No database dependency.

pub mod journal;
pub mod session_store;

pub use journal::FileTradeJournal;
pub use session_store::FileSessionStore;
