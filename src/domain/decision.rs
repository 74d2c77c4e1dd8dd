//! Oracle output parsing and validation.
//!
//! The decision oracle returns free-form text that is supposed to contain a
//! JSON object. Models wrap JSON in prose or markdown fences, emit numbers
//! as strings, and occasionally invent fields, so everything here treats
//! the blob as untrusted input: extract the first balanced JSON object,
//! deserialize with lenient numerics, then validate every field (enum
//! membership, finiteness, ranges, address echo) before anything is allowed
//! to touch the ledger.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::SimulationError;
use crate::domain::session::{TokenAddress, TradeAction, is_token_address};

/// A fully validated trade decision, safe to hand to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDecision {
    /// Target token address, normalized to lowercase.
    pub address: TokenAddress,
    /// Ticker symbol as reported by the oracle.
    pub symbol: String,
    /// Oracle's quoted USD price per unit; becomes the cost basis on a buy.
    pub price_usd: Decimal,
    /// BUY, SELL, or HOLD.
    pub action: TradeAction,
    /// Units to transact. Strictly positive for BUY/SELL, zero allowed for
    /// HOLD.
    pub amount: Decimal,
    /// The oracle's stated reasoning, for display and the journal.
    pub rationale: String,
}

/// A validated standalone token analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAnalysis {
    pub overview: String,
    pub recommendation: TradeAction,
    /// Oracle confidence in 0..=100.
    pub confidence: f64,
    pub reasoning: String,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
}

// ────────────────────────────────────────────
// JSON extraction
// ────────────────────────────────────────────

/// Returns the first balanced `{…}` object embedded in `text`, if any.
///
/// Walks the text tracking brace depth, skipping over string literals and
/// escape sequences, so prose or fenced markdown around the object does not
/// confuse the scan.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

// ────────────────────────────────────────────
// Lenient wire numerics
// ────────────────────────────────────────────

/// Accepts a JSON number or a numeric string; models use both.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }
    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("not a number: {e}"))),
    }
}

fn finite_decimal(value: f64, field: &str) -> Result<Decimal, SimulationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimulationError::InvalidDecision {
            reason: format!("{field} must be a finite non-negative number, got {value}"),
        });
    }
    Decimal::from_f64(value).ok_or_else(|| SimulationError::InvalidDecision {
        reason: format!("{field} {value} is not representable as a decimal"),
    })
}

// ────────────────────────────────────────────
// Trade decision
// ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecision {
    address: String,
    symbol: String,
    #[serde(deserialize_with = "lenient_f64")]
    price_usd: f64,
    action: String,
    #[serde(deserialize_with = "lenient_f64")]
    amount: f64,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Parses and validates a trade decision out of the oracle's raw reply.
///
/// `requested_address` is the address the caller asked about; a decision
/// echoing a different address is rejected rather than applied to the wrong
/// portfolio entry.
pub fn parse_trade_decision(
    raw_text: &str,
    requested_address: &str,
) -> Result<TradeDecision, SimulationError> {
    let json = extract_json_object(raw_text).ok_or_else(|| SimulationError::InvalidDecision {
        reason: "reply contains no JSON object".to_string(),
    })?;
    let raw: RawDecision =
        serde_json::from_str(json).map_err(|e| SimulationError::InvalidDecision {
            reason: format!("malformed decision JSON: {e}"),
        })?;

    let action =
        TradeAction::parse(&raw.action).ok_or_else(|| SimulationError::InvalidDecision {
            reason: format!("unknown action {:?}", raw.action),
        })?;

    if !raw.address.eq_ignore_ascii_case(requested_address) {
        return Err(SimulationError::InvalidDecision {
            reason: format!(
                "decision is for {} but {requested_address} was requested",
                raw.address
            ),
        });
    }

    let symbol = raw.symbol.trim();
    if symbol.is_empty() {
        return Err(SimulationError::InvalidDecision {
            reason: "symbol is blank".to_string(),
        });
    }

    let price_usd = finite_decimal(raw.price_usd, "priceUsd")?;
    let amount = finite_decimal(raw.amount, "amount")?;
    if amount.is_zero() && action != TradeAction::Hold {
        return Err(SimulationError::InvalidDecision {
            reason: format!("amount must be positive for {action}"),
        });
    }

    Ok(TradeDecision {
        address: requested_address.to_ascii_lowercase(),
        symbol: symbol.to_string(),
        price_usd,
        action,
        amount,
        rationale: raw.reasoning.unwrap_or_default(),
    })
}

// ────────────────────────────────────────────
// Token analysis
// ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    overview: String,
    recommendation: String,
    #[serde(deserialize_with = "lenient_f64")]
    confidence: f64,
    reasoning: String,
    #[serde(default)]
    risks: Vec<String>,
    #[serde(default)]
    opportunities: Vec<String>,
}

/// Parses and validates a standalone token analysis reply.
pub fn parse_token_analysis(raw_text: &str) -> Result<TokenAnalysis, SimulationError> {
    let json = extract_json_object(raw_text).ok_or_else(|| SimulationError::InvalidDecision {
        reason: "reply contains no JSON object".to_string(),
    })?;
    let raw: RawAnalysis =
        serde_json::from_str(json).map_err(|e| SimulationError::InvalidDecision {
            reason: format!("malformed analysis JSON: {e}"),
        })?;

    let recommendation =
        TradeAction::parse(&raw.recommendation).ok_or_else(|| SimulationError::InvalidDecision {
            reason: format!("unknown recommendation {:?}", raw.recommendation),
        })?;

    if !raw.confidence.is_finite() || !(0.0..=100.0).contains(&raw.confidence) {
        return Err(SimulationError::InvalidDecision {
            reason: format!("confidence must be in 0..=100, got {}", raw.confidence),
        });
    }
    if raw.overview.trim().is_empty() || raw.reasoning.trim().is_empty() {
        return Err(SimulationError::InvalidDecision {
            reason: "overview and reasoning must be non-empty".to_string(),
        });
    }

    Ok(TokenAnalysis {
        overview: raw.overview,
        recommendation,
        confidence: raw.confidence,
        reasoning: raw.reasoning,
        risks: raw.risks,
        opportunities: raw.opportunities,
    })
}

/// Quick check used by the orchestrator before any network call: the input
/// must look like a token address and must not target the reference asset
/// itself (the bankroll is not a tradable position).
pub fn validate_trade_target(
    raw: &str,
    reference_address: &str,
) -> Result<TokenAddress, SimulationError> {
    let candidate = raw.trim();
    if !is_token_address(candidate) {
        return Err(SimulationError::InvalidIdentifier(candidate.to_string()));
    }
    if candidate.eq_ignore_ascii_case(reference_address) {
        return Err(SimulationError::InvalidIdentifier(format!(
            "{candidate} is the reference asset"
        )));
    }
    Ok(candidate.to_ascii_lowercase())
}
