//! Claim candidates - unvalidated objects parsed from model output

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum characters of raw model output kept on a candidate
pub const EXCERPT_LIMIT: usize = 240;

/// An unvalidated key/value object produced by the response parser
///
/// The field map is kept open on purpose; only the gatekeeper projects it into
/// a typed [`Claim`](crate::Claim).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimCandidate {
    /// Fields exactly as the model returned them
    pub fields: Map<String, Value>,

    /// Index of the chunk whose response produced this candidate
    pub source_chunk_index: usize,

    /// Leading slice of the raw response, for diagnostics
    pub raw_response_excerpt: String,
}

impl ClaimCandidate {
    /// Create a candidate from a parsed JSON object
    pub fn new(fields: Map<String, Value>, source_chunk_index: usize, raw_response: &str) -> Self {
        Self {
            fields,
            source_chunk_index,
            raw_response_excerpt: excerpt(raw_response),
        }
    }

    /// Get a raw field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field as a trimmed, non-empty string
    ///
    /// Numbers and booleans are rendered to strings; null, empty strings,
    /// arrays, and objects yield `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Whether a field is absent, null, or an empty/whitespace string
    pub fn is_blank(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(a)) => a.is_empty(),
            Some(Value::Object(o)) => o.is_empty(),
            Some(_) => false,
        }
    }
}

/// Truncate raw model output on a char boundary
pub fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(EXCERPT_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
