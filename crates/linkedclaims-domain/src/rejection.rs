//! Rejection records - why a candidate or chunk produced no claim

use crate::candidate::ClaimCandidate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reason a candidate or chunk was rejected
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// A required field is absent, null, or empty
    #[error("missing required field '{field}'")]
    MissingRequiredField {
        /// Field name
        field: String,
    },

    /// Enum field value outside the allowed set
    #[error("invalid value '{value}' for enum field '{field}'")]
    InvalidEnumValue {
        /// Field name
        field: String,
        /// Offending value
        value: String,
    },

    /// Numeric field not coercible to a number
    #[error("invalid numeric value '{value}' for field '{field}'")]
    InvalidNumericValue {
        /// Field name
        field: String,
        /// Offending value
        value: String,
    },

    /// Date field not parseable
    #[error("invalid date '{value}' for field '{field}'")]
    InvalidDateValue {
        /// Field name
        field: String,
        /// Offending value
        value: String,
    },

    /// URI field without a scheme
    #[error("invalid URI '{value}' for field '{field}'")]
    InvalidUriValue {
        /// Field name
        field: String,
        /// Offending value
        value: String,
    },

    /// Confidence outside [0, 1]
    #[error("confidence {value} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange {
        /// Offending value
        value: f64,
    },

    /// Confidence below the configured floor
    #[error("confidence {value} is below threshold {threshold}")]
    BelowConfidenceThreshold {
        /// Candidate confidence
        value: f64,
        /// Configured floor
        threshold: f64,
    },

    /// `amt` without `unit` or `unit` without `amt`
    #[error("amount and unit must be provided together")]
    InconsistentAmountUnit,

    /// Array element that is not a JSON object
    #[error("response element is not an object: {excerpt}")]
    NotAnObject {
        /// Leading slice of the element
        excerpt: String,
    },

    /// No JSON structure could be recovered from the chunk's response
    #[error("unparseable model response: {detail}")]
    UnparseableResponse {
        /// Parser diagnostic
        detail: String,
    },

    /// Provider retries were exhausted for the chunk
    #[error("provider failure: {detail}")]
    ProviderFailure {
        /// Last provider error
        detail: String,
    },
}

impl RejectionReason {
    /// Field the reason refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            RejectionReason::MissingRequiredField { field }
            | RejectionReason::InvalidEnumValue { field, .. }
            | RejectionReason::InvalidNumericValue { field, .. }
            | RejectionReason::InvalidDateValue { field, .. }
            | RejectionReason::InvalidUriValue { field, .. } => Some(field),
            RejectionReason::ConfidenceOutOfRange { .. }
            | RejectionReason::BelowConfidenceThreshold { .. } => Some("confidence"),
            RejectionReason::InconsistentAmountUnit => Some("amt"),
            RejectionReason::NotAnObject { .. }
            | RejectionReason::UnparseableResponse { .. }
            | RejectionReason::ProviderFailure { .. } => None,
        }
    }

    /// Whether the reason applies to a whole chunk rather than one candidate
    pub fn is_chunk_level(&self) -> bool {
        matches!(
            self,
            RejectionReason::UnparseableResponse { .. } | RejectionReason::ProviderFailure { .. }
        )
    }
}

/// A rejected candidate or chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionRecord {
    /// Chunk the rejection belongs to
    pub chunk_index: usize,

    /// Candidate fields, absent for chunk-level rejections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Map<String, Value>>,

    /// Field that failed, if the reason names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Why the rejection happened
    pub reason: RejectionReason,
}

impl RejectionRecord {
    /// Rejection of a single candidate
    pub fn for_candidate(candidate: &ClaimCandidate, reason: RejectionReason) -> Self {
        Self {
            chunk_index: candidate.source_chunk_index,
            candidate: Some(candidate.fields.clone()),
            field: reason.field().map(str::to_string),
            reason,
        }
    }

    /// Rejection of a whole chunk
    pub fn for_chunk(chunk_index: usize, reason: RejectionReason) -> Self {
        Self {
            chunk_index,
            candidate: None,
            field: reason.field().map(str::to_string),
            reason,
        }
    }
}
