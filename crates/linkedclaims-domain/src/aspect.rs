//! Aspect module - namespaced category tags such as `impact:environmental:carbon`

use std::fmt;

/// Namespaced category tag on a claim
///
/// Uses colon-delimited hierarchy: `impact:social:water`.
/// Validated by segment shape, not against a fixed taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Aspect(String);

impl Aspect {
    /// Parse an aspect tag
    ///
    /// Surrounding whitespace is trimmed and segments are lower-cased so that
    /// `Impact:Social` and `impact:social` compare equal.
    ///
    /// # Errors
    /// Returns error if the tag is empty or has an empty segment (`impact::x`)
    pub fn parse(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("Aspect cannot be empty".to_string());
        }

        let segments: Vec<String> = trimmed
            .split(':')
            .map(|s| s.trim().to_lowercase())
            .collect();

        if segments.iter().any(|s| s.is_empty()) {
            return Err(format!("Aspect '{}' has an empty segment", value));
        }

        Ok(Self(segments.join(":")))
    }

    /// Get aspect as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Top-level category (`impact` for `impact:social:water`)
    pub fn root(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }

    /// Get depth (number of colon-separated segments)
    pub fn depth(&self) -> usize {
        self.0.split(':').count()
    }

    /// Check if this aspect is an ancestor of another
    pub fn is_parent_of(&self, other: &Aspect) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b':'
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
