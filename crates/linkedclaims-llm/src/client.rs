//! Retrying, time-bounded client over any provider

use crate::retry::RetryPolicy;
use linkedclaims_domain::traits::LlmProvider;
use linkedclaims_domain::ProviderError;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default per-call timeout (60 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// LLM client adapter used by the pipeline
///
/// Each `generate` call is bounded by `request_timeout`; a call that exceeds
/// it counts as a transient failure and goes through the retry policy like
/// any other.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
    request_timeout: Duration,
}

impl LlmClient {
    /// Wrap a provider with the default policy and timeout
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            policy: RetryPolicy::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Set the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the per-call timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The active retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Model identifier of the wrapped provider
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Generate a completion, retrying transient failures
    ///
    /// # Errors
    ///
    /// Returns the fatal error immediately, or the last transient error once
    /// the retry policy is exhausted
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        self.policy
            .run(|attempt| async move {
                debug!(attempt, model = self.model_name(), "Calling provider");
                match tokio::time::timeout(
                    self.request_timeout,
                    self.provider.generate(prompt, max_tokens),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Transient(format!(
                        "request timed out after {:?}",
                        self.request_timeout
                    ))),
                }
            })
            .await
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("model", &self.model_name())
            .field("policy", &self.policy)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
