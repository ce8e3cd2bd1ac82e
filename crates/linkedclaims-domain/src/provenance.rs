//! Provenance - where a claim came from
//!
//! Provenance is always supplied by the caller of the pipeline. Values the
//! model emits for `sourceURI` or `howKnown` are discarded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the claimed fact is known, in the LinkedTrust vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HowKnown {
    /// Observed directly
    FirstHand,
    /// Reported by someone who observed it
    SecondHand,
    /// Read from a published document (default for extraction)
    #[default]
    WebDocument,
    /// Asserted via a verified login
    VerifiedLogin,
    /// Taken from a signed document
    SignedDocument,
    /// Recorded on a blockchain
    Blockchain,
    /// Taken from a physical document
    PhysicalDocument,
    /// Imported through an integration
    Integration,
    /// Derived from research
    Research,
    /// Opinion
    Opinion,
    /// Anything else
    Other,
}

impl HowKnown {
    /// Wire name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            HowKnown::FirstHand => "FIRST_HAND",
            HowKnown::SecondHand => "SECOND_HAND",
            HowKnown::WebDocument => "WEB_DOCUMENT",
            HowKnown::VerifiedLogin => "VERIFIED_LOGIN",
            HowKnown::SignedDocument => "SIGNED_DOCUMENT",
            HowKnown::Blockchain => "BLOCKCHAIN",
            HowKnown::PhysicalDocument => "PHYSICAL_DOCUMENT",
            HowKnown::Integration => "INTEGRATION",
            HowKnown::Research => "RESEARCH",
            HowKnown::Opinion => "OPINION",
            HowKnown::Other => "OTHER",
        }
    }
}

impl fmt::Display for HowKnown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HowKnown {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        let tag = match normalized.as_str() {
            "FIRST_HAND" => HowKnown::FirstHand,
            "SECOND_HAND" => HowKnown::SecondHand,
            "WEB_DOCUMENT" => HowKnown::WebDocument,
            "VERIFIED_LOGIN" => HowKnown::VerifiedLogin,
            "SIGNED_DOCUMENT" => HowKnown::SignedDocument,
            "BLOCKCHAIN" => HowKnown::Blockchain,
            "PHYSICAL_DOCUMENT" => HowKnown::PhysicalDocument,
            "INTEGRATION" => HowKnown::Integration,
            "RESEARCH" => HowKnown::Research,
            "OPINION" => HowKnown::Opinion,
            "OTHER" => HowKnown::Other,
            _ => return Err(format!("Unknown howKnown tag: {}", s)),
        };
        Ok(tag)
    }
}

/// Caller-supplied provenance stamped onto every accepted claim
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    /// Identity of the source document
    pub source_uri: String,

    /// How the facts in the document are known
    pub how_known: HowKnown,
}

impl Provenance {
    /// Provenance for a document, tagged `WEB_DOCUMENT`
    pub fn new(source_uri: impl Into<String>) -> Self {
        Self {
            source_uri: source_uri.into(),
            how_known: HowKnown::default(),
        }
    }

    /// Override the `howKnown` tag
    pub fn with_how_known(mut self, how_known: HowKnown) -> Self {
        self.how_known = how_known;
        self
    }
}
