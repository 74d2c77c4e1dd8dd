//! Trade Orchestrator Use Case - One Decision Cycle per Token
//!
//! Sequences a single trade request end to end:
//! 1. Validate the token identifier (cheap, local)
//! 2. Confirm an active session exists (fail fast before any network I/O)
//! 3. Fetch the pair snapshot from the market data gateway
//! 4. Ask the decision oracle for BUY/SELL/HOLD
//! 5. Parse and validate the untrusted reply
//! 6. Re-load the session and apply the decision through the ledger
//! 7. Persist the new state (exactly one write) and journal the record
//!
//! External calls are never retried, and no lock is held across them: the
//! load→apply→persist tail runs under a per-key mutex after all network
//! I/O has completed, so racing requests cannot lose updates. Every
//! failure path performs zero store writes.

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::domain::decision::{self, TradeDecision};
use crate::domain::error::SimulationError;
use crate::domain::ledger::Ledger;
use crate::domain::session::{Portfolio, TradeRecord};
use crate::ports::journal::{JournalRecord, TradeJournal};
use crate::ports::market_data::MarketDataGateway;
use crate::ports::oracle::DecisionOracle;
use crate::ports::session_store::SessionStore;

/// Everything the console needs to present one executed trade.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
  /// The validated decision that was applied.
  pub decision: TradeDecision,
  /// The realized record appended to history and journal.
  pub record: TradeRecord,
  /// Portfolio state after the trade.
  pub portfolio: Portfolio,
  /// The oracle's verbatim reply, for display alongside the result.
  pub raw_reply: String,
}

/// Drives one full decision cycle against the four ports.
pub struct TradeOrchestrator<G, O, S, J>
where
  G: MarketDataGateway,
  O: DecisionOracle,
  S: SessionStore,
  J: TradeJournal,
{
  gateway: G,
  oracle: O,
  store: S,
  journal: J,
  ledger: Ledger,
  session_key: String,
  /// Serializes load→apply→persist against the store key.
  write_lock: Mutex<()>,
}

impl<G, O, S, J> TradeOrchestrator<G, O, S, J>
where
  G: MarketDataGateway,
  O: DecisionOracle,
  S: SessionStore,
  J: TradeJournal,
{
  pub fn new(gateway: G, oracle: O, store: S, journal: J, ledger: Ledger, session_key: String) -> Self {
    Self {
      gateway,
      oracle,
      store,
      journal,
      ledger,
      session_key,
      write_lock: Mutex::new(()),
    }
  }

  /// Run one decision cycle for a raw token identifier.
  #[instrument(skip(self), fields(token = %raw_identifier))]
  pub async fn execute_trade(&self, raw_identifier: &str) -> Result<TradeOutcome, SimulationError> {
    // 1. Validate the identifier before touching anything remote.
    let address =
      decision::validate_trade_target(raw_identifier, self.ledger.reference_address())?;

    // 2. Fail fast when no session is active. The authoritative load
    //    happens again under the write lock; this read just avoids
    //    spending gateway and oracle calls on an obvious miss, and its
    //    portfolio feeds the oracle prompt.
    let session = self
      .store
      .get(&self.session_key)
      .await
      .map_err(SimulationError::Store)?
      .ok_or(SimulationError::NoActiveSession)?;

    // 3. Market snapshot: one attempt, failure surfaces immediately.
    let snapshot = self.gateway.pair_snapshot(&address).await.map_err(|e| {
      SimulationError::MarketDataUnavailable {
        identifier: address.clone(),
        source: e,
      }
    })?;
    info!(
      symbol = %snapshot.symbol,
      price_usd = %snapshot.price_usd,
      liquidity_usd = snapshot.liquidity_usd,
      "Pair snapshot fetched"
    );

    // 4. Oracle decision in the context of the current portfolio.
    let raw_reply = self
      .oracle
      .trade_decision(&snapshot, &session.portfolio)
      .await
      .map_err(|e| SimulationError::InvalidDecision {
        reason: format!("completion request failed: {e}"),
      })?;

    // 5. Parse and validate the untrusted reply.
    let trade_decision = decision::parse_trade_decision(&raw_reply, &address)?;
    info!(
      action = %trade_decision.action,
      amount = %trade_decision.amount,
      price_usd = %trade_decision.price_usd,
      "Oracle decision accepted"
    );

    // 6. Critical section: re-load the authoritative session and apply.
    let guard = self.write_lock.lock().await;
    let mut session = self
      .store
      .get(&self.session_key)
      .await
      .map_err(SimulationError::Store)?
      .ok_or(SimulationError::NoActiveSession)?;
    let record = self
      .ledger
      .apply_decision(&mut session, &trade_decision, &snapshot)?;

    // 7. Exactly one store write per successful trade.
    self
      .store
      .set(&self.session_key, &session)
      .await
      .map_err(SimulationError::Store)?;
    drop(guard);

    let journal_record = JournalRecord {
      session_id: session.id,
      trade: record.clone(),
    };
    if let Err(e) = self.journal.append(&journal_record).await {
      warn!(
        error = %e,
        "Journal append failed; the session history still holds the record"
      );
    }

    info!(
      session_id = %session.id,
      holdings = session.portfolio.len(),
      "Trade applied and persisted"
    );
    Ok(TradeOutcome {
      decision: trade_decision,
      record,
      portfolio: session.portfolio,
      raw_reply,
    })
  }
}
