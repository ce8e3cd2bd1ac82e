//! Gatekeeper configuration

use linkedclaims_domain::Confidence;
use serde::{Deserialize, Serialize};

/// Default confidence assigned when a candidate omits one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Confidence stamped on candidates that omit it
    pub default_confidence: f64,

    /// Accept numeric strings with separators or symbols (`"$2,000,000"`, `"40%"`)
    pub coerce_numeric_strings: bool,

    /// Reject claims whose confidence is below this floor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            default_confidence: DEFAULT_CONFIDENCE,
            coerce_numeric_strings: true,
            min_confidence: None,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (accept anything well-formed)
    pub fn permissive() -> Self {
        Self {
            default_confidence: DEFAULT_CONFIDENCE,
            coerce_numeric_strings: true,
            min_confidence: None,
        }
    }

    /// Create a strict configuration (bare numbers only, confidence floor)
    pub fn strict() -> Self {
        Self {
            default_confidence: 0.3,
            coerce_numeric_strings: false,
            min_confidence: Some(0.5),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        Confidence::new(self.default_confidence)
            .map_err(|e| format!("default_confidence: {}", e))?;
        if let Some(floor) = self.min_confidence {
            Confidence::new(floor).map_err(|e| format!("min_confidence: {}", e))?;
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
