//! Session Lifecycle Use Case - Start, End, and Status
//!
//! Owns the three operations that bracket a simulation: opening a seeded
//! session, closing it with a PnL report, and reading it for display.
//! Only End fans out to the network per held token; Start needs a single
//! reference price and Status is pure store I/O.

use tracing::{info, instrument, warn};

use crate::domain::error::SimulationError;
use crate::domain::ledger::{Ledger, PnlReport};
use crate::domain::session::{LivePriceMap, Session};
use crate::ports::market_data::MarketDataGateway;
use crate::ports::session_store::SessionStore;

/// Drives session open/close against the gateway and the store.
pub struct SessionLifecycle<G, S>
where
  G: MarketDataGateway,
  S: SessionStore,
{
  gateway: G,
  store: S,
  ledger: Ledger,
  session_key: String,
}

impl<G, S> SessionLifecycle<G, S>
where
  G: MarketDataGateway,
  S: SessionStore,
{
  pub fn new(gateway: G, store: S, ledger: Ledger, session_key: String) -> Self {
    Self {
      gateway,
      store,
      ledger,
      session_key,
    }
  }

  /// Open a new session seeded with the reference-asset bankroll.
  ///
  /// Fails with `AlreadyActive` when a session exists (a status for the
  /// console, not an error exit) and persists nothing in that case.
  #[instrument(skip(self))]
  pub async fn start(&self) -> Result<Session, SimulationError> {
    if let Some(existing) = self
      .store
      .get(&self.session_key)
      .await
      .map_err(SimulationError::Store)?
    {
      info!(session_id = %existing.id, "Start requested while a session is active");
      return Err(SimulationError::AlreadyActive);
    }

    let reference_price = self.gateway.reference_price().await.map_err(|e| {
      SimulationError::MarketDataUnavailable {
        identifier: self.ledger.reference_symbol().to_string(),
        source: e,
      }
    })?;

    let session = self.ledger.start_session(reference_price);
    self
      .store
      .set(&self.session_key, &session)
      .await
      .map_err(SimulationError::Store)?;

    info!(
      session_id = %session.id,
      reference_price = %reference_price,
      "Session started"
    );
    Ok(session)
  }

  /// Close the active session and produce the PnL report.
  ///
  /// Per-holding price lookups that fail become error entries in the
  /// report; a failed reference price aborts with the session intact.
  /// Clearing the store slot is the final effect once a report exists.
  #[instrument(skip(self))]
  pub async fn end(&self) -> Result<PnlReport, SimulationError> {
    let session = self
      .store
      .get(&self.session_key)
      .await
      .map_err(SimulationError::Store)?
      .ok_or(SimulationError::NoActiveSession)?;

    let reference_price = self.gateway.reference_price().await.map_err(|e| {
      SimulationError::MarketDataUnavailable {
        identifier: self.ledger.reference_symbol().to_string(),
        source: e,
      }
    })?;

    let mut live = LivePriceMap::new();
    for address in session.traded_addresses(self.ledger.reference_address()) {
      match self.gateway.pair_snapshot(address).await {
        Ok(snapshot) => {
          live.insert(address.clone(), Ok(snapshot.price_usd));
        }
        Err(e) => {
          warn!(token = %address, error = %e, "Live price lookup failed at close");
          live.insert(address.clone(), Err(format!("price lookup failed: {e}")));
        }
      }
    }

    let session_id = session.id;
    let report = self.ledger.close_session(session, reference_price, &live);
    self
      .store
      .delete(&self.session_key)
      .await
      .map_err(SimulationError::Store)?;

    info!(
      session_id = %session_id,
      total_pnl_usd = %report.total_pnl_usd,
      holdings = report.holdings.len(),
      "Session ended"
    );
    Ok(report)
  }

  /// Read the current session for display. No network calls.
  pub async fn status(&self) -> Result<Option<Session>, SimulationError> {
    self
      .store
      .get(&self.session_key)
      .await
      .map_err(SimulationError::Store)
  }
}
