//! Core simulation domain types.
//!
//! Defines the entities of a paper-trading session: the session itself, the
//! holdings that make up its portfolio, and the immutable trade records that
//! form its history. These types are the foundation of the hexagonal
//! architecture's inner ring.
//!
//! All money math uses `Decimal`; `f64` appears only at the ports/adapters
//! boundary where untrusted wire values are validated before conversion.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────
// Type aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// Lowercase `0x…` token contract address used as the portfolio key.
pub type TokenAddress = String;

/// Portfolio map: token address → holding. Ordered so serialized snapshots
/// (prompts, persisted state, test fixtures) are deterministic.
pub type Portfolio = BTreeMap<TokenAddress, Holding>;

/// Live price lookups gathered by the caller before session close:
/// `Ok(price_usd)` or `Err(message)` per held address.
pub type LivePriceMap = std::collections::HashMap<TokenAddress, Result<Decimal, String>>;

// ────────────────────────────────────────────
// Reference asset defaults (Ethereum mainnet)
// ────────────────────────────────────────────

/// WETH contract address, the default reference asset.
pub const DEFAULT_REFERENCE_ADDRESS: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

/// Default reference asset ticker.
pub const DEFAULT_REFERENCE_SYMBOL: &str = "WETH";

/// Uniswap v3 WETH/USDC pool, the default pair for pricing the
/// reference asset in USD.
pub const DEFAULT_REFERENCE_PAIR: &str = "0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640";

/// Checks the chain's canonical address format: `0x` + 40 hex digits.
pub fn is_token_address(raw: &str) -> bool {
    let Some(hex) = raw.strip_prefix("0x") else {
        return false;
    };
    hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

// ────────────────────────────────────────────
// Enums shared across domain and ports
// ────────────────────────────────────────────

/// Action the oracle may take on a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    /// Strict parse of the oracle's action field. Only the exact uppercase
    /// forms are accepted; anything else is an invalid decision.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            "HOLD" => Some(Self::Hold),
            _ => None,
        }
    }

    /// Wire form, also used as a metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────
// Portfolio entities
// ────────────────────────────────────────────

/// A position in one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol for display and prompts.
    pub symbol: String,
    /// Units held. Never negative; zero only for the reference asset.
    pub amount: Decimal,
    /// Weighted-average acquisition price per unit, in USD.
    pub average_cost: Decimal,
}

/// Immutable record of one executed decision. Appended to the session
/// history and mirrored into the trade journal; never used for PnL
/// (PnL is recomputed from live prices at session end).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Token contract address the decision targeted.
    pub address: TokenAddress,
    /// Ticker symbol at execution time.
    pub symbol: String,
    /// Action taken.
    pub action: TradeAction,
    /// Units transacted (zero for HOLD).
    pub amount: Decimal,
    /// Executed USD price per unit.
    pub price_usd: Decimal,
    /// Execution timestamp.
    pub executed_at: DateTime<Utc>,
}

/// One complete simulation from start to end.
///
/// Created by session start with a single seeded reference-asset holding,
/// mutated in place by each trade, destroyed when the session ends. The
/// session store is the source of truth between operations; this struct is
/// never cached across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Correlates log lines and journal records.
    pub id: Uuid,
    /// True from start until end.
    pub active: bool,
    /// Current positions keyed by token address.
    pub portfolio: Portfolio,
    /// Chronological record of every applied decision.
    pub history: Vec<TradeRecord>,
    /// When the session was opened.
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Total number of open positions, reference asset included.
    pub fn holding_count(&self) -> usize {
        self.portfolio.len()
    }

    /// Addresses of held tokens other than the given reference asset.
    pub fn traded_addresses<'a>(
        &'a self,
        reference_address: &'a str,
    ) -> impl Iterator<Item = &'a TokenAddress> {
        self.portfolio
            .keys()
            .filter(move |addr| !addr.eq_ignore_ascii_case(reference_address))
    }
}
