//! Provider configuration and construction

use crate::client::{LlmClient, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::{anthropic, openai, AnthropicProvider, LlmError, MockProvider, OpenAiProvider};
use linkedclaims_domain::traits::LlmProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Environment variable holding the Anthropic API key
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Which provider backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// OpenAI Chat Completions API
    #[serde(rename = "openai")]
    OpenAi,
    /// Offline mock that answers `[]`
    Mock,
}

impl ProviderKind {
    /// Model used when `model_name` is left empty
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => anthropic::DEFAULT_MODEL,
            ProviderKind::OpenAi => openai::DEFAULT_MODEL,
            ProviderKind::Mock => "mock",
        }
    }

    /// Environment variable that must hold the API key
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Anthropic => Some(ANTHROPIC_API_KEY_ENV),
            ProviderKind::OpenAi => Some(OPENAI_API_KEY_ENV),
            ProviderKind::Mock => None,
        }
    }
}

/// Provider section of the pipeline configuration
///
/// API keys never appear here; they are read from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Backend
    pub kind: ProviderKind,

    /// Model identifier; empty selects the backend default
    pub model_name: String,

    /// Completion token budget per call
    pub max_tokens: u32,

    /// Total attempts per call, including the first
    pub retry_limit: u32,

    /// Per-call timeout (seconds)
    pub request_timeout_secs: u64,

    /// Endpoint override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Anthropic,
            model_name: anthropic::DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            retry_limit: DEFAULT_MAX_ATTEMPTS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            base_url: None,
            temperature: 0.0,
        }
    }
}

impl ProviderConfig {
    /// Model to request, falling back to the backend default
    pub fn effective_model(&self) -> &str {
        if self.model_name.trim().is_empty() {
            self.kind.default_model()
        } else {
            &self.model_name
        }
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy derived from `retry_limit`
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_attempts(self.retry_limit)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.retry_limit == 0 {
            return Err("retry_limit must be at least 1".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// Build the configured provider, reading its key from the process environment
///
/// A `.env` file in the working directory is loaded first if present.
///
/// # Errors
///
/// Returns error if the configuration is invalid or the API key is missing
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();
    build_provider_with(config, |name| std::env::var(name).ok())
}

/// Build the configured provider with an explicit credential lookup
pub fn build_provider_with<F>(
    config: &ProviderConfig,
    lookup: F,
) -> Result<Arc<dyn LlmProvider>, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    config.validate().map_err(LlmError::InvalidConfig)?;

    let api_key = match config.kind.credential_env() {
        Some(env) => Some(
            lookup(env)
                .filter(|k| !k.trim().is_empty())
                .ok_or(LlmError::MissingCredentials(env))?,
        ),
        None => None,
    };
    let model = config.effective_model();

    info!(provider = ?config.kind, model, "Building LLM provider");

    let provider: Arc<dyn LlmProvider> = match (config.kind, api_key) {
        (ProviderKind::Anthropic, Some(key)) => {
            let mut provider =
                AnthropicProvider::new(key, model)?.with_temperature(config.temperature);
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        (ProviderKind::OpenAi, Some(key)) => {
            let mut provider =
                OpenAiProvider::new(key, model)?.with_temperature(config.temperature);
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        (ProviderKind::Mock, _) => Arc::new(MockProvider::default().with_model(model)),
        (kind, None) => {
            return Err(LlmError::InvalidConfig(format!(
                "no credentials resolved for {:?}",
                kind
            )))
        }
    };

    Ok(provider)
}

/// Build a retrying client for the configured provider
pub fn build_client(config: &ProviderConfig) -> Result<LlmClient, LlmError> {
    let provider = build_provider(config)?;
    Ok(client_for(provider, config))
}

/// Wrap an existing provider with the configured retry policy and timeout
pub fn client_for(provider: Arc<dyn LlmProvider>, config: &ProviderConfig) -> LlmClient {
    LlmClient::new(provider)
        .with_retry_policy(config.retry_policy())
        .with_request_timeout(config.request_timeout())
}
