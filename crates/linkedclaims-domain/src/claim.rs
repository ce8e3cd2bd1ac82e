//! Claim module - the validated output unit of the extraction pipeline

use crate::provenance::HowKnown;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for a claim based on UUIDv7
///
/// UUIDv7 keeps identifiers chronologically sortable, which gives review
/// queues a stable insertion order without a separate counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimId(u128);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    ///
    /// # Examples
    ///
    /// ```
    /// use linkedclaims_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a new ClaimId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ClaimId from a UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use linkedclaims_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// let parsed = ClaimId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUID string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for ClaimId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClaimId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClaimId::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// A validated claim conforming to exactly one schema
///
/// Claims are only ever constructed by the gatekeeper from an accepted
/// candidate. Field names on the wire follow the LinkedClaims vocabulary
/// (`claim`, `amt`, `effectiveDate`, `sourceURI`, `howKnown`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Local identifier (not part of the registry wire payload)
    pub id: ClaimId,

    /// Entity the claim is about
    pub subject: String,

    /// Claim type, always equal to the name of the schema it was validated against
    #[serde(rename = "claim")]
    pub claim_type: String,

    /// Optional object of the claim (a URI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    /// Human-readable statement of the fact
    pub statement: String,

    /// Namespaced category tag, e.g. `impact:social`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect: Option<String>,

    /// Quantity, always paired with `unit`
    #[serde(rename = "amt", default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    /// Unit for `amount`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Date the claimed fact took effect
    #[serde(rename = "effectiveDate", default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,

    /// Extraction certainty in [0, 1]
    pub confidence: f64,

    /// Identity of the source document
    #[serde(rename = "sourceURI")]
    pub source_uri: String,

    /// How the fact is known
    #[serde(rename = "howKnown")]
    pub how_known: HowKnown,

    /// Chunk the surviving variant was extracted from
    #[serde(rename = "sourceChunkIndex")]
    pub source_chunk_index: usize,

    /// Every chunk that reported this fact (includes `source_chunk_index`)
    #[serde(rename = "supportingChunks", default)]
    pub supporting_chunks: BTreeSet<usize>,
}

impl Claim {
    /// Borrow the registry wire form of this claim
    pub fn to_wire(&self) -> WireClaim<'_> {
        WireClaim {
            subject: &self.subject,
            claim: &self.claim_type,
            object: self.object.as_deref(),
            statement: &self.statement,
            aspect: self.aspect.as_deref(),
            amt: self.amount,
            unit: self.unit.as_deref(),
            effective_date: self.effective_date,
            confidence: self.confidence,
            source_uri: &self.source_uri,
            how_known: self.how_known,
        }
    }

    /// Whether the claim carries a quantified amount
    pub fn is_quantified(&self) -> bool {
        self.amount.is_some()
    }
}

/// Registry wire schema for a claim
///
/// `subject, claim, object?, statement, aspect?, amt?, unit?, effectiveDate?,
/// confidence, sourceURI, howKnown`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireClaim<'a> {
    /// Subject entity
    pub subject: &'a str,
    /// Claim type
    pub claim: &'a str,
    /// Optional object URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<&'a str>,
    /// Statement text
    pub statement: &'a str,
    /// Optional aspect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect: Option<&'a str>,
    /// Optional amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amt: Option<f64>,
    /// Optional unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'a str>,
    /// Optional effective date
    #[serde(rename = "effectiveDate", skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Source document URI
    #[serde(rename = "sourceURI")]
    pub source_uri: &'a str,
    /// Provenance tag
    #[serde(rename = "howKnown")]
    pub how_known: HowKnown,
}
