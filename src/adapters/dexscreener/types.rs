//! DexScreener API Types - Wire Format Structures
//!
//! Serde DTOs for the DexScreener REST responses plus the pure pair
//! selection helpers. Prices arrive as JSON strings and are parsed into
//! exact decimals at this boundary; every metric field is optional because
//! the API omits whole sections for thin pairs.

use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::market::MarketSnapshot;

/// Response for `/latest/dex/tokens/{address}` and `/latest/dex/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct PairsResponse {
  /// `null` when the token resolves to nothing.
  #[serde(default)]
  pub pairs: Option<Vec<PairDto>>,
}

/// Response for `/latest/dex/pairs/{chain}/{pair}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PairResponse {
  #[serde(default)]
  pub pair: Option<PairDto>,
}

/// One trading pair as reported by DexScreener.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairDto {
  pub chain_id: String,
  #[serde(default)]
  pub dex_id: Option<String>,
  #[serde(default)]
  pub pair_address: Option<String>,
  pub base_token: TokenInfoDto,
  pub quote_token: TokenInfoDto,
  /// Price in the quote token, as a decimal string.
  pub price_native: String,
  /// Price in USD, as a decimal string. Missing for some exotic pairs.
  #[serde(default)]
  pub price_usd: Option<String>,
  #[serde(default)]
  pub txns: Option<TxnsDto>,
  #[serde(default)]
  pub volume: Option<VolumeDto>,
  #[serde(default)]
  pub price_change: Option<PriceChangeDto>,
  #[serde(default)]
  pub liquidity: Option<LiquidityDto>,
  #[serde(default)]
  pub fdv: Option<f64>,
  #[serde(default)]
  pub market_cap: Option<f64>,
}

/// Token descriptor embedded in a pair.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfoDto {
  pub address: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxnsDto {
  #[serde(default)]
  pub h24: Option<TxnWindowDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxnWindowDto {
  #[serde(default)]
  pub buys: Option<u64>,
  #[serde(default)]
  pub sells: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeDto {
  #[serde(default)]
  pub h24: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceChangeDto {
  #[serde(default)]
  pub h24: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiquidityDto {
  #[serde(default)]
  pub usd: Option<f64>,
}

impl PairDto {
  /// USD pool liquidity, zero when the API omits it.
  pub fn liquidity_usd(&self) -> f64 {
    self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
  }

  /// Convert the wire pair into a domain snapshot, parsing the string
  /// prices exactly.
  pub fn to_snapshot(&self) -> Result<MarketSnapshot> {
    let price_usd = self
      .price_usd
      .as_deref()
      .context("pair has no USD price")?;
    let price_usd = Decimal::from_str(price_usd)
      .with_context(|| format!("invalid priceUsd {price_usd:?}"))?;
    let price_native = Decimal::from_str(&self.price_native)
      .with_context(|| format!("invalid priceNative {:?}", self.price_native))?;

    Ok(MarketSnapshot {
      address: self.base_token.address.to_ascii_lowercase(),
      symbol: self.base_token.symbol.clone(),
      price_usd,
      price_native,
      liquidity_usd: self.liquidity_usd(),
      volume_h24: self.volume.as_ref().and_then(|v| v.h24),
      price_change_h24: self.price_change.as_ref().and_then(|p| p.h24),
      buys_h24: self.txns.as_ref().and_then(|t| t.h24.as_ref()).and_then(|w| w.buys),
      sells_h24: self.txns.as_ref().and_then(|t| t.h24.as_ref()).and_then(|w| w.sells),
      fdv: self.fdv,
      market_cap: self.market_cap,
    })
  }
}

/// First pair on one of the target chains quoted in the reference asset,
/// the pair a trade decision prices against.
pub fn select_reference_pair<'a>(
  pairs: &'a [PairDto],
  chain_ids: &[String],
  reference_address: &str,
) -> Option<&'a PairDto> {
  pairs.iter().find(|pair| {
    chain_ids.iter().any(|c| c.eq_ignore_ascii_case(&pair.chain_id))
      && pair
        .quote_token
        .address
        .eq_ignore_ascii_case(reference_address)
  })
}

/// Among pairs whose base token matches the query (by address, symbol, or
/// name), the one with the deepest USD liquidity.
pub fn select_most_liquid<'a>(pairs: &'a [PairDto], query: &str) -> Option<&'a PairDto> {
  pairs
    .iter()
    .filter(|pair| {
      let base = &pair.base_token;
      base.address.eq_ignore_ascii_case(query)
        || base.symbol.eq_ignore_ascii_case(query)
        || base.name.eq_ignore_ascii_case(query)
    })
    .max_by(|a, b| a.liquidity_usd().total_cmp(&b.liquidity_usd()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

  fn sample_pairs_json() -> String {
    format!(
      r#"{{
        "schemaVersion": "1.0.0",
        "pairs": [
          {{
            "chainId": "bsc",
            "dexId": "pancakeswap",
            "pairAddress": "0xaaa0000000000000000000000000000000000aaa",
            "baseToken": {{"address": "0x1111111111111111111111111111111111111111", "name": "Alpha", "symbol": "ALPHA"}},
            "quoteToken": {{"address": "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c", "name": "WBNB", "symbol": "WBNB"}},
            "priceNative": "0.004",
            "priceUsd": "2.41",
            "liquidity": {{"usd": 900000.0}}
          }},
          {{
            "chainId": "ethereum",
            "dexId": "uniswap",
            "pairAddress": "0xbbb0000000000000000000000000000000000bbb",
            "baseToken": {{"address": "0x1111111111111111111111111111111111111111", "name": "Alpha", "symbol": "ALPHA"}},
            "quoteToken": {{"address": "{WETH}", "name": "Wrapped Ether", "symbol": "WETH"}},
            "priceNative": "0.0012",
            "priceUsd": "2.40",
            "txns": {{"h24": {{"buys": 120, "sells": 80}}}},
            "volume": {{"h24": 510000.5}},
            "priceChange": {{"h24": -4.2}},
            "liquidity": {{"usd": 350000.0}},
            "fdv": 24000000.0
          }}
        ]
      }}"#
    )
  }

  fn chains() -> Vec<String> {
    vec!["ethereum".to_string(), "ethereumpow".to_string()]
  }

  #[test]
  fn test_deserialize_pairs_response() {
    let response: PairsResponse = serde_json::from_str(&sample_pairs_json()).unwrap();
    let pairs = response.pairs.unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[1].chain_id, "ethereum");
    assert_eq!(pairs[1].price_usd.as_deref(), Some("2.40"));
  }

  #[test]
  fn test_null_pairs_deserializes_to_none() {
    let response: PairsResponse =
      serde_json::from_str(r#"{"schemaVersion": "1.0.0", "pairs": null}"#).unwrap();
    assert!(response.pairs.is_none());
  }

  #[test]
  fn test_select_reference_pair_filters_chain_and_quote() {
    let response: PairsResponse = serde_json::from_str(&sample_pairs_json()).unwrap();
    let pairs = response.pairs.unwrap();
    let selected = select_reference_pair(&pairs, &chains(), WETH).unwrap();
    assert_eq!(selected.chain_id, "ethereum");
    assert_eq!(selected.quote_token.symbol, "WETH");
  }

  #[test]
  fn test_select_reference_pair_none_without_match() {
    let response: PairsResponse = serde_json::from_str(&sample_pairs_json()).unwrap();
    let pairs = response.pairs.unwrap();
    assert!(select_reference_pair(&pairs, &["solana".to_string()], WETH).is_none());
    let other_quote = "0x2222222222222222222222222222222222222222";
    assert!(select_reference_pair(&pairs, &chains(), other_quote).is_none());
  }

  #[test]
  fn test_select_most_liquid_matches_base_and_ranks() {
    let response: PairsResponse = serde_json::from_str(&sample_pairs_json()).unwrap();
    let pairs = response.pairs.unwrap();
    // By symbol: the BSC pair has deeper liquidity and wins.
    let best = select_most_liquid(&pairs, "ALPHA").unwrap();
    assert_eq!(best.chain_id, "bsc");
    // Unrelated query matches nothing.
    assert!(select_most_liquid(&pairs, "BETA").is_none());
  }

  #[test]
  fn test_to_snapshot_parses_string_prices() {
    let response: PairsResponse = serde_json::from_str(&sample_pairs_json()).unwrap();
    let pairs = response.pairs.unwrap();
    let snapshot = pairs[1].to_snapshot().unwrap();
    assert_eq!(snapshot.price_usd, dec!(2.40));
    assert_eq!(snapshot.price_native, dec!(0.0012));
    assert_eq!(snapshot.symbol, "ALPHA");
    assert_eq!(snapshot.buys_h24, Some(120));
    assert!((snapshot.liquidity_usd - 350_000.0).abs() < f64::EPSILON);
  }

  #[test]
  fn test_to_snapshot_requires_usd_price() {
    let json = r#"{
      "chainId": "ethereum",
      "baseToken": {"address": "0x1", "name": "", "symbol": "X"},
      "quoteToken": {"address": "0x2", "name": "", "symbol": "Y"},
      "priceNative": "0.5"
    }"#;
    let pair: PairDto = serde_json::from_str(json).unwrap();
    assert!(pair.to_snapshot().is_err());
  }
}
