//! Shared HTTP plumbing for hosted providers

use crate::LlmError;
use linkedclaims_domain::ProviderError;
use reqwest::StatusCode;
use std::time::Duration;

/// Build a client with a connect timeout; the per-call deadline is enforced
/// by `LlmClient`.
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()?)
}

/// Map a non-success status to a provider error
pub(crate) fn classify_status(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    let message = format!("{} API error ({}): {}", provider, status, body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        ProviderError::Transient(message)
    } else {
        ProviderError::Fatal(message)
    }
}

/// Map a transport failure to a provider error
pub(crate) fn classify_transport(provider: &str, err: reqwest::Error) -> ProviderError {
    if err.is_builder() {
        ProviderError::Fatal(format!("{} request could not be built: {}", provider, err))
    } else {
        ProviderError::Transient(format!("{} request failed: {}", provider, err))
    }
}
