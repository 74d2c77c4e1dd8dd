//! Simulation error taxonomy.
//!
//! Every failure a session operation can surface. None of these is fatal to
//! the process: the console reports them and the persisted session is left
//! either untouched or in the new fully-consistent state, never half-applied.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    /// Start requested while a session is already running. A status
    /// message, not a failure.
    #[error("a simulation session is already active")]
    AlreadyActive,

    /// Trade/End/Status requested before Start. A status message, not a
    /// failure.
    #[error("no active simulation session, run start first")]
    NoActiveSession,

    /// Input does not look like a token contract address, or targets the
    /// reference asset itself.
    #[error("invalid token identifier: {0}")]
    InvalidIdentifier(String),

    /// The oracle produced no usable decision: missing/unparseable JSON,
    /// unknown action, out-of-range numerics, or no completion at all.
    #[error("decision rejected: {reason}")]
    InvalidDecision { reason: String },

    /// The market data gateway could not resolve the identifier to a
    /// tradable pair, or the request itself failed.
    #[error("market data unavailable for {identifier}")]
    MarketDataUnavailable {
        identifier: String,
        #[source]
        source: anyhow::Error,
    },

    /// A buy would cost more reference asset than the session holds.
    #[error("insufficient funds: cost {needed} exceeds reference balance {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    /// A sell exceeds the held amount (or the token is not held at all).
    #[error("insufficient holdings of {symbol}: requested {requested}, held {held}")]
    InsufficientHoldings {
        symbol: String,
        requested: Decimal,
        held: Decimal,
    },

    /// Session store I/O failed; the operation was aborted.
    #[error("session store failure")]
    Store(#[source] anyhow::Error),
}

impl SimulationError {
    /// Stable label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyActive => "already_active",
            Self::NoActiveSession => "no_active_session",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::InvalidDecision { .. } => "invalid_decision",
            Self::MarketDataUnavailable { .. } => "market_data_unavailable",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InsufficientHoldings { .. } => "insufficient_holdings",
            Self::Store(_) => "store",
        }
    }

    /// True for the two lifecycle outcomes the console shows as plain
    /// status lines rather than errors.
    pub fn is_status(&self) -> bool {
        matches!(self, Self::AlreadyActive | Self::NoActiveSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_messages() {
        let err = SimulationError::InsufficientFunds {
            needed: dec!(0.5),
            available: dec!(0.25),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: cost 0.5 exceeds reference balance 0.25"
        );
        assert_eq!(err.kind(), "insufficient_funds");
    }

    #[test]
    fn test_status_classification() {
        assert!(SimulationError::AlreadyActive.is_status());
        assert!(SimulationError::NoActiveSession.is_status());
        assert!(!SimulationError::InvalidIdentifier("x".into()).is_status());
    }
}
