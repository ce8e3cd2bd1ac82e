//! Error types for the Extractor

use linkedclaims_domain::{ProviderError, UnknownSchemaError};
use linkedclaims_gatekeeper::GatekeeperError;
use linkedclaims_llm::LlmError;
use thiserror::Error;

/// Errors that abort a whole extraction
///
/// Per-chunk and per-candidate problems are reported as rejection records in
/// the [`ExtractionResult`](crate::ExtractionResult) instead.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Requested schema is not registered
    #[error(transparent)]
    UnknownSchema(#[from] UnknownSchemaError),

    /// Provider rejected a request in a way retries cannot fix
    #[error("Fatal provider error on chunk {chunk_index}: {source}")]
    Provider {
        /// Chunk whose call failed
        chunk_index: usize,
        /// Underlying provider error
        source: ProviderError,
    },

    /// Provider could not be constructed
    #[error("LLM setup error: {0}")]
    Llm(#[from] LlmError),

    /// Gatekeeper could not be constructed
    #[error("Gatekeeper setup error: {0}")]
    Gatekeeper(#[from] GatekeeperError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    /// Whether the error comes from configuration rather than a provider call
    pub fn is_config(&self) -> bool {
        !matches!(self, ExtractorError::Provider { .. })
    }
}
