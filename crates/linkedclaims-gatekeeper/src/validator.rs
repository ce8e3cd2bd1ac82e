//! Claim validation logic

use crate::{GatekeeperError, ValidationConfig};
use chrono::{DateTime, NaiveDate};
use linkedclaims_domain::schema::field_names::{
    AMOUNT, ASPECT, CONFIDENCE, EFFECTIVE_DATE, OBJECT, STATEMENT, SUBJECT, UNIT,
};
use linkedclaims_domain::{
    Aspect, Claim, ClaimCandidate, ClaimId, Confidence, FieldSpec, FieldType, Provenance, RejectionReason,
    RejectionRecord, Schema,
};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Result of validating one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Candidate became a claim
    Accepted(Claim),

    /// Candidate was rejected
    Rejected(RejectionRecord),
}

impl ValidationOutcome {
    /// Whether the candidate was accepted
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }

    /// Convert into a `Result`
    pub fn into_result(self) -> Result<Claim, RejectionRecord> {
        match self {
            ValidationOutcome::Accepted(claim) => Ok(claim),
            ValidationOutcome::Rejected(record) => Err(record),
        }
    }
}

/// The Gatekeeper turns candidates into claims or rejection records
///
/// Stateless apart from its configuration; one instance can be shared across
/// concurrent extraction tasks.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    ///
    /// # Errors
    /// Returns error if the configuration is out of range
    pub fn new(config: ValidationConfig) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(Self { config })
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a candidate against a schema
    ///
    /// Checks run in a fixed order and the first failure wins: required
    /// fields, per-field types, confidence, then the amount/unit pairing.
    /// `source_uri` and `how_known` always come from `provenance`; any values
    /// the model put in the candidate for them are ignored.
    pub fn validate(
        &self,
        candidate: &ClaimCandidate,
        schema: &Schema,
        provenance: &Provenance,
    ) -> ValidationOutcome {
        match self.check(candidate, schema, provenance) {
            Ok(claim) => {
                trace!(chunk = candidate.source_chunk_index, subject = %claim.subject, "Candidate accepted");
                ValidationOutcome::Accepted(claim)
            }
            Err(reason) => {
                debug!(
                    chunk = candidate.source_chunk_index,
                    schema = %schema.name,
                    reason = %reason,
                    "Candidate rejected"
                );
                ValidationOutcome::Rejected(RejectionRecord::for_candidate(candidate, reason))
            }
        }
    }

    /// Validate a batch of candidates, preserving order
    pub fn validate_all(
        &self,
        candidates: &[ClaimCandidate],
        schema: &Schema,
        provenance: &Provenance,
    ) -> (Vec<Claim>, Vec<RejectionRecord>) {
        let mut claims = Vec::new();
        let mut rejections = Vec::new();
        for candidate in candidates {
            match self.validate(candidate, schema, provenance) {
                ValidationOutcome::Accepted(claim) => claims.push(claim),
                ValidationOutcome::Rejected(record) => rejections.push(record),
            }
        }
        (claims, rejections)
    }

    fn check(
        &self,
        candidate: &ClaimCandidate,
        schema: &Schema,
        provenance: &Provenance,
    ) -> Result<Claim, RejectionReason> {
        // 1. Required fields (confidence falls back to the default instead)
        for field in schema.required_fields() {
            if field.name != CONFIDENCE && candidate.is_blank(&field.name) {
                return Err(RejectionReason::MissingRequiredField {
                    field: field.name.clone(),
                });
            }
        }
        // Every claim has a subject and a statement, whatever the schema marks
        let subject = required_text(candidate, SUBJECT)?;
        let statement = required_text(candidate, STATEMENT)?;

        // 2. Per-field type checks, in schema order
        for field in &schema.fields {
            if field.name == CONFIDENCE || candidate.is_blank(&field.name) {
                continue;
            }
            if let Some(value) = candidate.get(&field.name) {
                self.check_field(field, value)?;
            }
        }

        // 3. Confidence
        let confidence = self.confidence(candidate)?;

        // 4. Amount and unit travel together
        let amount = self.optional_number(candidate, schema, AMOUNT)?;
        let mut unit = optional_text(candidate, schema, UNIT);
        match (amount, &unit) {
            (Some(_), None) => return Err(RejectionReason::InconsistentAmountUnit),
            (None, Some(orphan)) => {
                debug!(unit = %orphan, "Dropping unit without amount");
                unit = None;
            }
            _ => {}
        }

        let effective_date = match optional_raw(candidate, schema, EFFECTIVE_DATE) {
            Some(value) => Some(parse_date(value).ok_or_else(|| {
                RejectionReason::InvalidDateValue {
                    field: EFFECTIVE_DATE.to_string(),
                    value: render(value),
                }
            })?),
            None => None,
        };

        let aspect = optional_text(candidate, schema, ASPECT).map(|raw| {
            Aspect::parse(&raw)
                .map(|a| a.as_str().to_string())
                .unwrap_or(raw)
        });

        let source_chunk_index = candidate.source_chunk_index;

        Ok(Claim {
            id: ClaimId::new(),
            subject,
            claim_type: schema.name.clone(),
            object: optional_text(candidate, schema, OBJECT),
            statement,
            aspect,
            amount,
            unit,
            effective_date,
            confidence,
            source_uri: provenance.source_uri.clone(),
            how_known: provenance.how_known,
            source_chunk_index,
            supporting_chunks: BTreeSet::from([source_chunk_index]),
        })
    }

    fn check_field(&self, field: &FieldSpec, value: &Value) -> Result<(), RejectionReason> {
        match field.field_type {
            FieldType::Enum => {
                let text = render(value);
                if !field.allows(text.trim()) {
                    return Err(RejectionReason::InvalidEnumValue {
                        field: field.name.clone(),
                        value: text,
                    });
                }
            }
            FieldType::Number => {
                if self.coerce_number(value).is_none() {
                    return Err(RejectionReason::InvalidNumericValue {
                        field: field.name.clone(),
                        value: render(value),
                    });
                }
            }
            FieldType::Date => {
                if parse_date(value).is_none() {
                    return Err(RejectionReason::InvalidDateValue {
                        field: field.name.clone(),
                        value: render(value),
                    });
                }
            }
            FieldType::Uri => {
                if !looks_like_uri(&render(value)) {
                    return Err(RejectionReason::InvalidUriValue {
                        field: field.name.clone(),
                        value: render(value),
                    });
                }
            }
            FieldType::String => {}
        }
        Ok(())
    }

    fn confidence(&self, candidate: &ClaimCandidate) -> Result<f64, RejectionReason> {
        let value = match candidate.get(CONFIDENCE) {
            Some(value) if !candidate.is_blank(CONFIDENCE) => value,
            _ => return Ok(self.config.default_confidence),
        };

        let raw = self
            .coerce_number(value)
            .ok_or_else(|| RejectionReason::InvalidNumericValue {
                field: CONFIDENCE.to_string(),
                value: render(value),
            })?;
        let confidence =
            Confidence::new(raw).map_err(|_| RejectionReason::ConfidenceOutOfRange { value: raw })?;

        if let Some(threshold) = self.config.min_confidence {
            if !confidence.meets(threshold) {
                return Err(RejectionReason::BelowConfidenceThreshold {
                    value: confidence.value(),
                    threshold,
                });
            }
        }

        Ok(confidence.value())
    }

    fn optional_number(
        &self,
        candidate: &ClaimCandidate,
        schema: &Schema,
        field: &str,
    ) -> Result<Option<f64>, RejectionReason> {
        match optional_raw(candidate, schema, field) {
            Some(value) => self
                .coerce_number(value)
                .map(Some)
                .ok_or_else(|| RejectionReason::InvalidNumericValue {
                    field: field.to_string(),
                    value: render(value),
                }),
            None => Ok(None),
        }
    }

    /// Coerce a JSON value to a finite number
    fn coerce_number(&self, value: &Value) -> Option<f64> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let trimmed = s.trim();
                trimmed.parse::<f64>().ok().or_else(|| {
                    if self.config.coerce_numeric_strings {
                        parse_loose_number(trimmed)
                    } else {
                        None
                    }
                })
            }
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }
}

/// Raw value of a schema-defined, non-blank field
fn optional_raw<'a>(candidate: &'a ClaimCandidate, schema: &Schema, field: &str) -> Option<&'a Value> {
    if schema.field(field).is_none() || candidate.is_blank(field) {
        return None;
    }
    candidate.get(field)
}

fn required_text(candidate: &ClaimCandidate, field: &str) -> Result<String, RejectionReason> {
    candidate.text(field).ok_or_else(|| RejectionReason::MissingRequiredField {
        field: field.to_string(),
    })
}

fn optional_text(candidate: &ClaimCandidate, schema: &Schema, field: &str) -> Option<String> {
    schema.field(field)?;
    candidate.text(field)
}

/// Render a value for a rejection record
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse numbers like `$2,000,000`, `1 500`, `40%`, `€3.5`
fn parse_loose_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | '$' | '€' | '£' | '¥' | '%') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Parse `YYYY-MM-DD`, an RFC 3339 timestamp, `YYYY-MM`, or a bare year
///
/// A bare year maps to December 31st and a year-month to the first of the month.
pub(crate) fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(&text) {
        return Some(ts.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d") {
        return Some(date);
    }
    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = text.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 12, 31);
    }
    None
}

/// Whether `text` has a URI scheme (`https:`, `urn:`, `did:`)
pub(crate) fn looks_like_uri(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((scheme, rest)) = text.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
}
