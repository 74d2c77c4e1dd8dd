//! Token Analyzer Use Case - Standalone Research Queries
//!
//! Answers "what do you think of this token?" without touching the
//! session: resolve the query to its most liquid pair, ask the oracle for
//! a structured analysis, validate the reply. The analyzer shares the
//! gateway and oracle with the trade path but can never mutate the
//! portfolio.

use tracing::{info, instrument};

use crate::domain::decision::{self, TokenAnalysis};
use crate::domain::error::SimulationError;
use crate::domain::market::MarketSnapshot;
use crate::ports::market_data::MarketDataGateway;
use crate::ports::oracle::DecisionOracle;

/// A validated analysis together with the market data it was based on.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
  pub snapshot: MarketSnapshot,
  pub analysis: TokenAnalysis,
}

pub struct TokenAnalyzer<G, O>
where
  G: MarketDataGateway,
  O: DecisionOracle,
{
  gateway: G,
  oracle: O,
}

impl<G, O> TokenAnalyzer<G, O>
where
  G: MarketDataGateway,
  O: DecisionOracle,
{
  pub fn new(gateway: G, oracle: O) -> Self {
    Self { gateway, oracle }
  }

  /// Analyze a token given an address or a bare symbol query.
  #[instrument(skip(self), fields(query = %query))]
  pub async fn analyze(&self, query: &str) -> Result<AnalysisReport, SimulationError> {
    let query = query.trim();
    if query.is_empty() {
      return Err(SimulationError::InvalidIdentifier(String::new()));
    }

    let snapshot = self.gateway.token_overview(query).await.map_err(|e| {
      SimulationError::MarketDataUnavailable {
        identifier: query.to_string(),
        source: e,
      }
    })?;
    info!(
      symbol = %snapshot.symbol,
      liquidity_usd = snapshot.liquidity_usd,
      "Most liquid pair resolved"
    );

    let raw_reply = self.oracle.token_analysis(&snapshot).await.map_err(|e| {
      SimulationError::InvalidDecision {
        reason: format!("completion request failed: {e}"),
      }
    })?;
    let analysis = decision::parse_token_analysis(&raw_reply)?;

    info!(
      recommendation = %analysis.recommendation,
      confidence = analysis.confidence,
      "Analysis accepted"
    );
    Ok(AnalysisReport { snapshot, analysis })
  }
}
