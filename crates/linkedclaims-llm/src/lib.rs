//! LinkedClaims LLM Provider Layer
//!
//! Pluggable LLM provider implementations behind the `LlmProvider` trait from
//! `linkedclaims-domain`, plus the retrying client the pipeline talks to.
//!
//! # Architecture
//!
//! Providers make exactly one request per `generate` call and classify
//! failures as transient or fatal. [`LlmClient`] wraps a provider with a
//! per-call timeout and a bounded [`RetryPolicy`].
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `AnthropicProvider`: Anthropic Messages API
//! - `OpenAiProvider`: OpenAI Chat Completions API
//!
//! # Examples
//!
//! ```
//! use linkedclaims_llm::MockProvider;
//! use linkedclaims_domain::traits::LlmProvider;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = MockProvider::new("[]");
//! let result = provider.generate("test prompt", 256).await.unwrap();
//! assert_eq!(result, "[]");
//! # }
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod client;
pub mod config;
mod http;
pub mod mock;
pub mod openai;
pub mod retry;

use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use client::LlmClient;
pub use config::{
    build_client, build_provider, build_provider_with, client_for, ProviderConfig, ProviderKind,
};
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use retry::RetryPolicy;

/// Errors raised while configuring or constructing a provider
///
/// Failures of individual calls are reported as
/// [`ProviderError`](linkedclaims_domain::ProviderError) instead.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Required API key is not set
    #[error("Missing credentials: set {0}")]
    MissingCredentials(&'static str),

    /// Configuration value out of range
    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
