//! Registry connection settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default LinkedTrust API base URL
pub const DEFAULT_API_URL: &str = "https://live.linkedtrust.us/api";

/// Environment variable holding the registry API key
pub const LINKEDTRUST_API_KEY_ENV: &str = "LINKEDTRUST_API_KEY";

/// Publisher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Base URL of the registry API
    pub api_url: String,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Claims below this confidence are not submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            min_confidence: None,
        }
    }
}

impl PublisherConfig {
    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(format!("api_url must be an http(s) URL, got '{}'", self.api_url));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if let Some(min) = self.min_confidence {
            if !(0.0..=1.0).contains(&min) {
                return Err("min_confidence must be between 0.0 and 1.0".to_string());
            }
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
