//! Portfolio ledger: the simulation's accounting engine.
//!
//! Pure and synchronous: owns the session state machine (seed, buy/sell
//! transitions, close-out report) and nothing else. All I/O (market
//! lookups, oracle calls, persistence) happens in the usecases that drive
//! this type. Every failure condition is checked before the first mutation,
//! so a rejected decision leaves the session byte-for-byte unchanged.
//!
//! Accounting rules:
//! - Buys debit the reference asset by `amount * price_native` and merge
//!   into the target holding under weighted-average cost basis.
//! - Sells debit the target holding and credit the reference asset with the
//!   proceeds; a holding that reaches exactly zero is pruned.
//! - PnL is computed fresh from live prices at close, never accumulated
//!   trade by trade.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::decision::TradeDecision;
use crate::domain::error::SimulationError;
use crate::domain::market::MarketSnapshot;
use crate::domain::session::{
    DEFAULT_REFERENCE_ADDRESS, DEFAULT_REFERENCE_SYMBOL, Holding, LivePriceMap, Portfolio,
    Session, TokenAddress, TradeAction, TradeRecord,
};

// ────────────────────────────────────────────
// Close-out report
// ────────────────────────────────────────────

/// One line of the close-out report. Holdings whose live price lookup
/// failed are carried as explicit error entries and excluded from totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoldingReport {
    #[serde(rename_all = "camelCase")]
    Priced {
        symbol: String,
        address: TokenAddress,
        current_price: Decimal,
        average_cost: Decimal,
        amount: Decimal,
        pnl_usd: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    Unpriced {
        symbol: String,
        address: TokenAddress,
        error: String,
    },
}

/// Final profit/loss report produced when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlReport {
    /// Live USD price of the reference asset at close.
    pub reference_price_usd: Decimal,
    /// Sum of per-holding PnL over priced holdings only.
    pub total_pnl_usd: Decimal,
    /// `total_pnl_usd` converted at the live reference price.
    pub total_pnl_in_reference_asset: Decimal,
    /// When the session was closed.
    pub closed_at: DateTime<Utc>,
    /// Per-holding breakdown, reference asset included.
    pub holdings: Vec<HoldingReport>,
}

// ────────────────────────────────────────────
// Ledger
// ────────────────────────────────────────────

/// Session accounting engine, parameterized by the reference asset that
/// seeds and denominates the bankroll.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Reference asset contract address, lowercase.
    reference_address: TokenAddress,
    /// Reference asset ticker.
    reference_symbol: String,
    /// Bankroll seeded into every new session, in reference-asset units.
    seed_amount: Decimal,
}

impl Ledger {
    /// Creates a ledger for the given reference asset.
    pub fn new(reference_address: &str, reference_symbol: &str, seed_amount: Decimal) -> Self {
        Self {
            reference_address: reference_address.to_ascii_lowercase(),
            reference_symbol: reference_symbol.to_string(),
            seed_amount,
        }
    }

    /// WETH on Ethereum mainnet with the standard 10-unit bankroll.
    pub fn mainnet_default() -> Self {
        Self::new(DEFAULT_REFERENCE_ADDRESS, DEFAULT_REFERENCE_SYMBOL, dec!(10))
    }

    pub fn reference_address(&self) -> &str {
        &self.reference_address
    }

    pub fn reference_symbol(&self) -> &str {
        &self.reference_symbol
    }

    /// Opens a fresh session holding only the seeded reference asset, with
    /// the live reference price as its cost basis. The caller is
    /// responsible for rejecting a start while another session is active.
    pub fn start_session(&self, reference_price_usd: Decimal) -> Session {
        let mut portfolio = Portfolio::new();
        portfolio.insert(
            self.reference_address.clone(),
            Holding {
                symbol: self.reference_symbol.clone(),
                amount: self.seed_amount,
                average_cost: reference_price_usd,
            },
        );
        Session {
            id: Uuid::new_v4(),
            active: true,
            portfolio,
            history: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Applies one validated decision to the session.
    ///
    /// On success the portfolio is mutated, the realized record is appended
    /// to the history, and a copy is returned for journaling. On any error
    /// the session is untouched; all checks run before the first write.
    pub fn apply_decision(
        &self,
        session: &mut Session,
        decision: &TradeDecision,
        snapshot: &MarketSnapshot,
    ) -> Result<TradeRecord, SimulationError> {
        match decision.action {
            TradeAction::Hold => {}
            TradeAction::Buy => self.apply_buy(session, decision, snapshot)?,
            TradeAction::Sell => self.apply_sell(session, decision, snapshot)?,
        }

        let record = TradeRecord {
            address: decision.address.clone(),
            symbol: decision.symbol.clone(),
            action: decision.action,
            amount: decision.amount,
            price_usd: decision.price_usd,
            executed_at: Utc::now(),
        };
        session.history.push(record.clone());
        Ok(record)
    }

    fn apply_buy(
        &self,
        session: &mut Session,
        decision: &TradeDecision,
        snapshot: &MarketSnapshot,
    ) -> Result<(), SimulationError> {
        let cost = decision.amount * snapshot.price_native;
        let available = session
            .portfolio
            .get(&self.reference_address)
            .map_or(Decimal::ZERO, |h| h.amount);
        if cost > available {
            return Err(SimulationError::InsufficientFunds {
                needed: cost,
                available,
            });
        }

        if let Some(reference) = session.portfolio.get_mut(&self.reference_address) {
            reference.amount -= cost;
        }
        match session.portfolio.get_mut(&decision.address) {
            Some(existing) => {
                // Weighted-average cost basis across the old and new lots.
                let total_value = existing.amount * existing.average_cost
                    + decision.amount * decision.price_usd;
                let merged_amount = existing.amount + decision.amount;
                existing.average_cost = total_value / merged_amount;
                existing.amount = merged_amount;
            }
            None => {
                session.portfolio.insert(
                    decision.address.clone(),
                    Holding {
                        symbol: decision.symbol.clone(),
                        amount: decision.amount,
                        average_cost: decision.price_usd,
                    },
                );
            }
        }
        Ok(())
    }

    fn apply_sell(
        &self,
        session: &mut Session,
        decision: &TradeDecision,
        snapshot: &MarketSnapshot,
    ) -> Result<(), SimulationError> {
        let held = session
            .portfolio
            .get(&decision.address)
            .map_or(Decimal::ZERO, |h| h.amount);
        if held < decision.amount {
            return Err(SimulationError::InsufficientHoldings {
                symbol: decision.symbol.clone(),
                requested: decision.amount,
                held,
            });
        }

        let proceeds = decision.amount * snapshot.price_native;
        let mut drained = false;
        if let Some(holding) = session.portfolio.get_mut(&decision.address) {
            holding.amount -= decision.amount;
            drained = holding.amount.is_zero();
        }
        // Zero-amount holdings are pruned; the reference asset alone may
        // legitimately sit at zero and always stays listed.
        if drained && !decision.address.eq_ignore_ascii_case(&self.reference_address) {
            session.portfolio.remove(&decision.address);
        }
        if let Some(reference) = session.portfolio.get_mut(&self.reference_address) {
            reference.amount += proceeds;
        }
        Ok(())
    }

    /// Produces the close-out report from live prices gathered by the
    /// caller. Consumes the session; clearing the store slot is the
    /// caller's final step.
    pub fn close_session(
        &self,
        session: Session,
        reference_price_usd: Decimal,
        live: &LivePriceMap,
    ) -> PnlReport {
        let mut holdings = Vec::with_capacity(session.portfolio.len());
        let mut total_pnl_usd = Decimal::ZERO;

        for (address, holding) in &session.portfolio {
            let looked_up = if address.eq_ignore_ascii_case(&self.reference_address) {
                Ok(reference_price_usd)
            } else {
                live.get(address)
                    .cloned()
                    .unwrap_or_else(|| Err("no live price provided".to_string()))
            };
            match looked_up {
                Ok(current_price) => {
                    let pnl_usd = (current_price - holding.average_cost) * holding.amount;
                    total_pnl_usd += pnl_usd;
                    holdings.push(HoldingReport::Priced {
                        symbol: holding.symbol.clone(),
                        address: address.clone(),
                        current_price,
                        average_cost: holding.average_cost,
                        amount: holding.amount,
                        pnl_usd,
                    });
                }
                Err(error) => {
                    holdings.push(HoldingReport::Unpriced {
                        symbol: holding.symbol.clone(),
                        address: address.clone(),
                        error,
                    });
                }
            }
        }

        let total_pnl_in_reference_asset = if reference_price_usd.is_zero() {
            Decimal::ZERO
        } else {
            total_pnl_usd / reference_price_usd
        };

        PnlReport {
            reference_price_usd,
            total_pnl_usd,
            total_pnl_in_reference_asset,
            closed_at: Utc::now(),
            holdings,
        }
    }
}
