//! Market snapshot: a point-in-time read of one token's trading pair.
//!
//! Produced by the market data gateway, consumed by the ledger (cost math
//! needs exact decimals) and serialized into oracle prompts (camelCase keys
//! so the model sees conventional API field names). Informational metrics
//! stay `f64`; only the two prices carry accounting weight.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::session::TokenAddress;

/// Snapshot of a token's pair against the reference asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Base token contract address, lowercase.
    pub address: TokenAddress,
    /// Base token ticker.
    pub symbol: String,
    /// Price per unit in USD.
    pub price_usd: Decimal,
    /// Price per unit in the reference asset (the pair's quote).
    pub price_native: Decimal,
    /// Pool liquidity in USD.
    pub liquidity_usd: f64,
    /// 24h traded volume in USD, when the feed reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_h24: Option<f64>,
    /// 24h price change in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_change_h24: Option<f64>,
    /// 24h buy transaction count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buys_h24: Option<u64>,
    /// 24h sell transaction count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sells_h24: Option<u64>,
    /// Fully-diluted valuation in USD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fdv: Option<f64>,
    /// Market capitalization in USD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}
