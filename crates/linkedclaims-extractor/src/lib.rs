//! LinkedClaims Extractor
//!
//! Turns document chunks into validated, deduplicated LinkedClaims using an LLM.
//!
//! # Architecture
//!
//! ```text
//! Document → Segmenter → Chunks ─┬─ Prompt → LLM → Parser → Gatekeeper ─┬─ Dedup → ExtractionResult
//!                                 └─ (one task per chunk, bounded)     ─┘
//! ```
//!
//! # Key Features
//!
//! - **Schema-driven prompts**: field descriptions are rendered verbatim
//! - **Tolerant parsing**: fenced, prose-wrapped, single-object, and truncated replies
//! - **Isolated chunk failures**: a bad chunk becomes a rejection record
//! - **Bounded concurrency**: chunks run in parallel up to `concurrency_limit`
//! - **Cancellation and deadlines**: partial results come back marked `truncated`
//! - **Cross-chunk dedup**: the same fact seen on overlapping pages is merged
//!
//! # Example Usage
//!
//! ```no_run
//! use linkedclaims_domain::{DocumentChunk, SchemaRegistry};
//! use linkedclaims_extractor::{Extractor, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let extractor = Extractor::from_pipeline_config(&config, SchemaRegistry::with_builtin())?;
//!
//! let chunks = vec![DocumentChunk::new(0, "Our foundation donated $2,000,000 to schools in 2023.")];
//! let result = extractor
//!     .extract_document(chunks, "impact", "https://example.org/annual-report.pdf")
//!     .await?;
//!
//! for claim in &result.claims {
//!     println!("{} ({:.2})", claim.statement, claim.confidence);
//! }
//! println!("Rejected: {}", result.rejections.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod dedup;
mod error;
mod extractor;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::TextSegmenter;
pub use config::{ChunkStrategy, ExtractorConfig, PipelineConfig};
pub use dedup::{dedup_claims, is_duplicate};
pub use error::ExtractorError;
pub use extractor::{Extractor, DEFAULT_MAX_TOKENS};
pub use parser::{parse_response, ParseStrategy, ParsedResponse, UnparseableResponseError};
pub use prompt::{build_prompt, PromptBuilder};
pub use types::{ExtractionMetadata, ExtractionResult};

// Cancellation handle accepted by `Extractor::extract_document_with_cancel`
pub use tokio_util::sync::CancellationToken;
