//! Configuration for the Extractor

use crate::error::ExtractorError;
use linkedclaims_gatekeeper::ValidationConfig;
use linkedclaims_llm::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Text chunking strategy for documents without page breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Split by paragraphs (double newlines)
    #[default]
    ByParagraph,
    /// Split by sections (markdown headers or numbered sections)
    BySection,
    /// Split at sentence boundaries up to the size limit
    BySize,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum chunks processed concurrently
    pub concurrency_limit: usize,

    /// Jaccard threshold above which two statements are the same fact
    pub dedup_similarity_threshold: f64,

    /// Wall-clock budget for a whole document (seconds); unbounded if absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_timeout_secs: Option<u64>,

    /// Extra LLM calls for a chunk whose response could not be parsed
    pub parse_retry_limit: u32,

    /// Chunks with fewer non-whitespace characters are skipped by the segmenter
    pub min_chunk_chars: usize,

    /// Maximum chunk size (characters) when splitting unpaginated text
    pub max_chunk_size: usize,

    /// Text chunking strategy for unpaginated text
    pub chunk_strategy: ChunkStrategy,
}

impl ExtractorConfig {
    /// Get the document timeout as a Duration
    pub fn document_timeout(&self) -> Option<Duration> {
        self.document_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency_limit == 0 {
            return Err("concurrency_limit must be greater than 0".to_string());
        }
        if !(self.dedup_similarity_threshold > 0.0 && self.dedup_similarity_threshold <= 1.0) {
            return Err("dedup_similarity_threshold must be in (0.0, 1.0]".to_string());
        }
        if self.document_timeout_secs == Some(0) {
            return Err("document_timeout_secs must be greater than 0".to_string());
        }
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        if self.min_chunk_chars >= self.max_chunk_size {
            return Err("min_chunk_chars must be smaller than max_chunk_size".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            concurrency_limit: 4,
            dedup_similarity_threshold: 0.8,
            document_timeout_secs: None,
            parse_retry_limit: 1,
            min_chunk_chars: 50,
            max_chunk_size: 10_000,
            chunk_strategy: ChunkStrategy::ByParagraph,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: more parallelism, a document deadline, no re-asks
    pub fn aggressive() -> Self {
        Self {
            concurrency_limit: 8,
            dedup_similarity_threshold: 0.7,
            document_timeout_secs: Some(300),
            parse_retry_limit: 0,
            min_chunk_chars: 50,
            max_chunk_size: 5_000,
            chunk_strategy: ChunkStrategy::ByParagraph,
        }
    }

    /// Lenient preset: fewer concurrent calls, larger chunks, more re-asks
    pub fn lenient() -> Self {
        Self {
            concurrency_limit: 2,
            dedup_similarity_threshold: 0.9,
            document_timeout_secs: None,
            parse_retry_limit: 2,
            min_chunk_chars: 20,
            max_chunk_size: 20_000,
            chunk_strategy: ChunkStrategy::BySection,
        }
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

/// Full pipeline configuration
///
/// ```toml
/// [provider]
/// kind = "anthropic"
/// model_name = "claude-3-sonnet-20240229"
/// max_tokens = 4096
/// retry_limit = 3
/// request_timeout_secs = 60
///
/// [extraction]
/// concurrency_limit = 4
/// dedup_similarity_threshold = 0.8
///
/// [validation]
/// default_confidence = 0.5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// LLM provider settings
    pub provider: ProviderConfig,

    /// Chunking, concurrency, and dedup settings
    pub extraction: ExtractorConfig,

    /// Candidate validation settings
    pub validation: ValidationConfig,
}

impl PipelineConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.provider
            .validate()
            .map_err(|e| format!("[provider] {}", e))?;
        self.extraction
            .validate()
            .map_err(|e| format!("[extraction] {}", e))?;
        self.validation
            .validate()
            .map_err(|e| format!("[validation] {}", e))?;
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

    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ExtractorError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents).map_err(ExtractorError::Config)?;
        config.validate().map_err(ExtractorError::Config)?;
        Ok(config)
    }
}
