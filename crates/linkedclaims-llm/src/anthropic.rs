//! Anthropic Provider Implementation
//!
//! Talks to the Anthropic Messages API (`/v1/messages`). One request per
//! `generate` call; retry and timeout policy belong to [`LlmClient`](crate::LlmClient).
//!
//! # Examples
//!
//! ```no_run
//! use linkedclaims_llm::AnthropicProvider;
//!
//! let provider = AnthropicProvider::new("sk-ant-...", "claude-3-sonnet-20240229").unwrap();
//! ```

use crate::http::{build_http_client, classify_status, classify_transport};
use crate::LlmError;
use async_trait::async_trait;
use linkedclaims_domain::traits::LlmProvider;
use linkedclaims_domain::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Anthropic API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value
pub const API_VERSION: &str = "2023-06-01";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

/// Default timeout for the underlying HTTP client (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingCredentials("ANTHROPIC_API_KEY"));
        }

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: model.into(),
            temperature: 0.0,
            client: build_http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
        })
    }

    /// Override the API endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature: self.temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport("Anthropic", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport("Anthropic", e))?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => format!("{}: {}", err.error.error_type, err.error.message),
                Err(_) => body,
            };
            return Err(classify_status("Anthropic", status, &detail));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Fatal(format!("Unexpected Anthropic response: {}", e)))?;

        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            debug!(model = %self.model, max_tokens, "Anthropic response hit max_tokens");
        }

        Ok(parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
