//! Decision Oracle Adapter
//!
//! Implements the `DecisionOracle` port against an OpenAI-compatible
//! chat-completions API. Owns the prompt templates; returns raw completion
//! text for the domain to parse and validate.

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiOracle};
