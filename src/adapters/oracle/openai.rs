//! OpenAI-compatible Decision Oracle - Chat Completions Client
//!
//! Implements the `DecisionOracle` port against any chat-completions
//! endpoint speaking the OpenAI wire format. The API key comes from the
//! `OPENAI_API_KEY` environment variable only, never from config files.
//! Prompts embed the pair snapshot and portfolio as JSON and demand a
//! JSON-only reply; parsing that reply is the domain's job, so this
//! adapter returns the raw completion text untouched.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::market::MarketSnapshot;
use crate::domain::session::Portfolio;
use crate::ports::oracle::DecisionOracle;

/// Default OpenAI chat-completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Configuration for the oracle client.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full completions endpoint URL.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Completion token budget.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 512,
            temperature: 0.2,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Chat-completions client implementing the oracle port.
#[derive(Clone)]
pub struct OpenAiOracle {
    http: Client,
    config: OpenAiConfig,
    api_key: String,
    /// Ticker the prompts denominate profit in (e.g., WETH).
    reference_symbol: String,
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    max_tokens: usize,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl OpenAiOracle {
    /// Create a new oracle client with an explicit API key.
    pub fn new(config: OpenAiConfig, api_key: String, reference_symbol: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            config,
            api_key,
            reference_symbol,
        })
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env(config: OpenAiConfig, reference_symbol: String) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY environment variable is not set")?;
        Self::new(config, api_key, reference_symbol)
    }

    /// One chat completion, one attempt.
    async fn complete(&self, prompt: String) -> Result<String> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion API error {status}: {body}");
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to decode completion response")?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("Completion contained no choices")
    }

    fn trade_prompt(&self, snapshot: &MarketSnapshot, portfolio: &Portfolio) -> String {
        let pair_json = serde_json::to_string_pretty(snapshot).unwrap_or_default();
        let portfolio_json = serde_json::to_string_pretty(portfolio).unwrap_or_default();
        let reference = &self.reference_symbol;
        format!(
            "You are managing a simulated {reference}-denominated trading portfolio.\n\
             Your goal is to maximize profit measured in {reference}.\n\n\
             Current pair data:\n{pair_json}\n\n\
             Current portfolio (token address -> holding):\n{portfolio_json}\n\n\
             Decide whether to BUY, SELL, or HOLD {symbol} ({address}).\n\
             Amounts are in token units. Do not spend the entire {reference} balance \
             on a single buy, and never sell more than the portfolio holds.\n\n\
             Reply with ONLY a JSON object, no other text:\n\
             {{\"address\": \"<token address>\", \"symbol\": \"<token symbol>\", \
             \"priceUsd\": <number>, \"action\": \"BUY\" | \"SELL\" | \"HOLD\", \
             \"amount\": <token units>, \"reasoning\": \"<one sentence>\"}}",
            symbol = snapshot.symbol,
            address = snapshot.address,
        )
    }

    fn analysis_prompt(&self, snapshot: &MarketSnapshot) -> String {
        let pair_json = serde_json::to_string_pretty(snapshot).unwrap_or_default();
        format!(
            "You are a cryptocurrency market analyst. Analyze this trading pair:\n\n\
             {pair_json}\n\n\
             Consider price action, liquidity depth, volume, and transaction flow.\n\n\
             Reply with ONLY a JSON object, no other text:\n\
             {{\"overview\": \"<market position and key metrics>\", \
             \"recommendation\": \"BUY\" | \"SELL\" | \"HOLD\", \
             \"confidence\": <0-100>, \"reasoning\": \"<why>\", \
             \"risks\": [\"<risk>\"], \"opportunities\": [\"<opportunity>\"]}}"
        )
    }
}

#[async_trait]
impl DecisionOracle for OpenAiOracle {
    async fn trade_decision(
        &self,
        snapshot: &MarketSnapshot,
        portfolio: &Portfolio,
    ) -> Result<String> {
        debug!(model = %self.config.model, token = %snapshot.symbol, "Requesting trade decision");
        self.complete(self.trade_prompt(snapshot, portfolio)).await
    }

    async fn token_analysis(&self, snapshot: &MarketSnapshot) -> Result<String> {
        debug!(model = %self.config.model, token = %snapshot.symbol, "Requesting token analysis");
        self.complete(self.analysis_prompt(snapshot)).await
    }
}
