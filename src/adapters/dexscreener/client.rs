//! DexScreener HTTP Client - Rate-limited REST Lookups
//!
//! Wraps reqwest with a concurrency cap and a per-minute rate limiter for
//! the public DexScreener API. Requests are made exactly once; a failed
//! lookup fails the simulated trade rather than being retried.

use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;

use super::types::{PairResponse, PairsResponse, select_most_liquid, select_reference_pair};
use crate::domain::market::MarketSnapshot;
use crate::domain::session::{
  DEFAULT_REFERENCE_ADDRESS, DEFAULT_REFERENCE_PAIR, TokenAddress, is_token_address,
};
use crate::ports::market_data::MarketDataGateway;

/// Configuration for the DexScreener client.
#[derive(Debug, Clone)]
pub struct DexScreenerConfig {
  /// Base URL for the API.
  pub base_url: String,
  /// Chains a trade pair may live on, in preference order.
  pub chain_ids: Vec<String>,
  /// Reference asset contract address (the required quote token).
  pub reference_address: String,
  /// Chain of the pair used to price the reference asset in USD.
  pub reference_pair_chain: String,
  /// Address of the pair used to price the reference asset in USD.
  pub reference_pair_address: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Request budget per minute (public API etiquette).
  pub max_requests_per_minute: u32,
}

impl Default for DexScreenerConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api.dexscreener.com".to_string(),
      chain_ids: vec!["ethereum".to_string(), "ethereumpow".to_string()],
      reference_address: DEFAULT_REFERENCE_ADDRESS.to_string(),
      reference_pair_chain: "ethereum".to_string(),
      reference_pair_address: DEFAULT_REFERENCE_PAIR.to_string(),
      timeout: Duration::from_secs(10),
      max_concurrent: 4,
      max_requests_per_minute: 60,
    }
  }
}

/// Rate-limited HTTP client for the DexScreener API.
#[derive(Clone)]
pub struct DexScreenerClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: DexScreenerConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  /// Per-minute request throttle.
  throttle: Arc<DefaultDirectRateLimiter>,
}

impl DexScreenerClient {
  /// Create a new DexScreener client.
  pub fn new(config: DexScreenerConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
    let per_minute = NonZeroU32::new(config.max_requests_per_minute)
      .context("max_requests_per_minute must be positive")?;
    let throttle = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

    Ok(Self {
      http,
      config,
      semaphore,
      throttle,
    })
  }

  /// Execute one throttled GET and decode the JSON body. Exactly one
  /// attempt; the caller decides what a failure means.
  async fn fetch<T: DeserializeOwned>(
    &self,
    request: reqwest::RequestBuilder,
    what: &str,
  ) -> Result<T> {
    let _permit = self.semaphore.acquire().await.context("Semaphore closed")?;
    self.throttle.until_ready().await;

    let response = request
      .send()
      .await
      .with_context(|| format!("Request for {what} failed"))?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      anyhow::bail!("API error {status} for {what}: {body}");
    }
    response
      .json::<T>()
      .await
      .with_context(|| format!("Failed to decode {what} response"))
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url, path)
  }
}

#[async_trait]
impl MarketDataGateway for DexScreenerClient {
  async fn pair_snapshot(&self, address: &TokenAddress) -> Result<MarketSnapshot> {
    let path = format!("/latest/dex/tokens/{address}");
    debug!(%address, "Fetching token pairs");
    let response: PairsResponse = self
      .fetch(self.http.get(self.url(&path)), "token pairs")
      .await?;

    let pairs = response.pairs.unwrap_or_default();
    let pair = select_reference_pair(&pairs, &self.config.chain_ids, &self.config.reference_address)
      .with_context(|| format!("no reference-asset pair found for {address}"))?;
    pair.to_snapshot()
  }

  async fn reference_price(&self) -> Result<Decimal> {
    let path = format!(
      "/latest/dex/pairs/{}/{}",
      self.config.reference_pair_chain, self.config.reference_pair_address
    );
    debug!("Fetching reference price");
    let response: PairResponse = self
      .fetch(self.http.get(self.url(&path)), "reference pair")
      .await?;

    let pair = response.pair.context("reference pair not found")?;
    let price = pair.price_usd.as_deref().context("reference pair has no USD price")?;
    Decimal::from_str(price).with_context(|| format!("invalid reference price {price:?}"))
  }

  async fn token_overview(&self, query: &str) -> Result<MarketSnapshot> {
    let query = query.trim();
    let response: PairsResponse = if is_token_address(query) {
      let path = format!("/latest/dex/tokens/{query}");
      self.fetch(self.http.get(self.url(&path)), "token pairs").await?
    } else {
      // Symbol/name search; reqwest handles the query encoding.
      self
        .fetch(
          self.http.get(self.url("/latest/dex/search")).query(&[("q", query)]),
          "pair search",
        )
        .await?
    };

    let pairs = response.pairs.unwrap_or_default();
    let pair = select_most_liquid(&pairs, query)
      .with_context(|| format!("no pairs found for {query:?}"))?;
    pair.to_snapshot()
  }

  async fn is_healthy(&self) -> bool {
    self.reference_price().await.is_ok()
  }
}
