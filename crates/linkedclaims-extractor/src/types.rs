//! Result types for extraction

use chrono::{DateTime, Utc};
use linkedclaims_domain::{Claim, RejectionRecord};
use serde::{Deserialize, Serialize};

/// Result of extracting one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Deduplicated claims, ordered by source chunk then extraction order
    pub claims: Vec<Claim>,

    /// Rejected candidates and failed chunks, ordered by chunk
    pub rejections: Vec<RejectionRecord>,

    /// Whether processing stopped before every chunk finished
    pub truncated: bool,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// Claims at or above a confidence floor
    pub fn claims_above(&self, min_confidence: f64) -> impl Iterator<Item = &Claim> {
        self.claims
            .iter()
            .filter(move |c| c.confidence >= min_confidence)
    }

    /// Chunk-level rejections (parse failures, exhausted retries)
    pub fn failed_chunks(&self) -> Vec<usize> {
        self.rejections
            .iter()
            .filter(|r| r.reason.is_chunk_level())
            .map(|r| r.chunk_index)
            .collect()
    }

    /// Load a saved result
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize for saving or handing to a publisher
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Metadata about an extraction operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Identity of the source document
    pub source_uri: String,

    /// Schema the claims were validated against
    pub schema: String,

    /// Name of the LLM model used
    pub model_name: String,

    /// When extraction started
    pub started_at: DateTime<Utc>,

    /// Chunks handed to the pipeline
    pub chunks_total: usize,

    /// Chunks whose workers finished before any cancellation
    pub chunks_completed: usize,

    /// Candidates parsed across all chunks
    pub candidates_parsed: usize,

    /// Claims folded into another during dedup
    pub duplicates_merged: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
