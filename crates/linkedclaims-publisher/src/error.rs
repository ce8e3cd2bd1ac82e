//! Error types for the publisher

use linkedclaims_domain::ClaimId;
use thiserror::Error;

/// Publishing and review-queue errors
#[derive(Debug, Error)]
pub enum PublishError {
    /// API key not configured
    #[error("Missing credentials: set {0}")]
    MissingCredentials(&'static str),

    /// Claim lacks a field the registry requires
    #[error("Invalid claim: {0}")]
    InvalidClaim(String),

    /// Registry answered with a non-success status
    #[error("Registry error (HTTP {status}): {body}")]
    Registry {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Registry rejected the API key
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Connection error (network, DNS, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Other HTTP client failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Claim is not in the review queue
    #[error("Claim {0} is not in the review queue")]
    NotQueued(ClaimId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Queue file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            PublishError::Connection(e.to_string())
        } else if e.is_status() {
            match e.status() {
                Some(status) if status.as_u16() == 401 || status.as_u16() == 403 => {
                    PublishError::Auth(format!("HTTP {}", status))
                }
                Some(status) => PublishError::Registry {
                    status: status.as_u16(),
                    body: e.to_string(),
                },
                None => PublishError::Http(e.to_string()),
            }
        } else {
            PublishError::Http(e.to_string())
        }
    }
}
