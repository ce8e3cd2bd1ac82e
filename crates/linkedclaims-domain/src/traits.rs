//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{DocumentChunk, ProviderError};
use async_trait::async_trait;

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (linkedclaims-llm). A provider
/// makes exactly one request per call; retries and timeouts are applied by
/// the caller.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a text completion for `prompt`
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError>;

    /// Model identifier, recorded in extraction metadata
    fn model_name(&self) -> &str;
}

/// Trait for splitting a document into chunks
///
/// Implemented by the application layer (linkedclaims-extractor)
pub trait DocumentSegmenter {
    /// Split `document` into indexed chunks
    fn segment(&self, document: &str) -> Vec<DocumentChunk>;
}
