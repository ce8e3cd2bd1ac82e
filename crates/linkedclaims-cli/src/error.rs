//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction aborted
    #[error("Extraction error: {0}")]
    Extractor(#[from] linkedclaims_extractor::ExtractorError),

    /// Publisher setup or submission error
    #[error("Publish error: {0}")]
    Publish(#[from] linkedclaims_publisher::PublishError),

    /// Custom schema file rejected
    #[error("Schema error: {0}")]
    Schema(#[from] linkedclaims_domain::SchemaError),

    /// Document could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Some claims were not accepted by the registry
    #[error("{failed} of {total} claim(s) failed to publish")]
    PublishIncomplete {
        /// Claims that failed
        failed: usize,
        /// Claims handled
        total: usize,
    },
}
