//! LinkedClaims Domain Layer
//!
//! This crate contains the core data model shared by every stage of the
//! extraction pipeline. It defines the vocabulary (schemas, candidates,
//! claims, rejections) and the trait interfaces that the infrastructure
//! crates implement.
//!
//! ## Key Concepts
//!
//! - **Schema**: Declarative definition of a claim shape, including the field
//!   descriptions that are rendered verbatim into prompts
//! - **Candidate**: An unvalidated, open key/value object parsed from model output
//! - **Claim**: A validated, closed record conforming to exactly one schema
//! - **Rejection**: Why a candidate (or a whole chunk) did not become a claim
//! - **Provenance**: `sourceURI` and `howKnown`, always supplied by the caller
//!
//! ## Architecture
//!
//! - No network or runtime dependencies
//! - Candidate → Claim projection happens only in the gatekeeper
//! - Trait definitions for LLM providers and document segmenters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aspect;
pub mod candidate;
pub mod chunk;
pub mod claim;
pub mod confidence;
pub mod error;
pub mod provenance;
pub mod rejection;
pub mod schema;
pub mod similarity;
pub mod traits;

// Re-exports for convenience
pub use aspect::Aspect;
pub use candidate::ClaimCandidate;
pub use chunk::DocumentChunk;
pub use claim::{Claim, ClaimId, WireClaim};
pub use confidence::Confidence;
pub use error::{ProviderError, SchemaError, UnknownSchemaError};
pub use provenance::{HowKnown, Provenance};
pub use rejection::{RejectionReason, RejectionRecord};
pub use schema::{FieldSpec, FieldType, Schema, SchemaRegistry};
