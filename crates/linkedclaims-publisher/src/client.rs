//! LinkedTrust registry client

use crate::config::{PublisherConfig, LINKEDTRUST_API_KEY_ENV};
use crate::error::PublishError;
use crate::report::{PublishReport, PublishStatus};
use chrono::{NaiveDate, Utc};
use linkedclaims_domain::{Claim, HowKnown};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Maximum characters of an error body kept in a [`PublishError::Registry`]
const ERROR_BODY_LIMIT: usize = 500;

/// Client that submits claims to a LinkedTrust registry
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    min_confidence: Option<f64>,
}

impl RegistryClient {
    /// Create a client for `config.api_url` authenticating with `api_key`
    ///
    /// # Errors
    /// Returns error if the key is empty, the configuration is invalid, or
    /// the HTTP client cannot be built
    pub fn new(config: &PublisherConfig, api_key: impl Into<String>) -> Result<Self, PublishError> {
        config.validate().map_err(PublishError::Config)?;

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PublishError::MissingCredentials(LINKEDTRUST_API_KEY_ENV));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            min_confidence: config.min_confidence,
        })
    }

    /// Create a client reading the API key from the environment
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env(config: &PublisherConfig) -> Result<Self, PublishError> {
        // A missing .env file is not an error
        let _ = dotenvy::dotenv();
        let api_key = std::env::var(LINKEDTRUST_API_KEY_ENV)
            .map_err(|_| PublishError::MissingCredentials(LINKEDTRUST_API_KEY_ENV))?;
        Self::new(config, api_key)
    }

    /// Endpoint claims are posted to
    pub fn claims_endpoint(&self) -> String {
        format!("{}/v1/claims", self.api_url)
    }

    /// Submit one claim
    ///
    /// # Errors
    /// Returns error if the claim is incomplete or the registry refuses it
    pub async fn submit_claim(&self, claim: &Claim) -> Result<Value, PublishError> {
        check_claim(claim)?;
        let payload = prepare_payload(claim, Utc::now().date_naive())?;

        debug!(subject = %claim.subject, endpoint = %self.claims_endpoint(), "Submitting claim");

        let response = self
            .http
            .post(self.claims_endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(PublishError::Auth(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PublishError::Registry {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// Submit claims one by one, continuing past failures
    ///
    /// Claims below the configured `min_confidence` are reported as skipped.
    pub async fn publish_batch(&self, claims: &[Claim]) -> PublishReport {
        let mut report = PublishReport::default();
        let total = claims.len();

        for (i, claim) in claims.iter().enumerate() {
            if let Some(min) = self.min_confidence {
                if claim.confidence < min {
                    debug!(subject = %claim.subject, confidence = claim.confidence, "Skipping low-confidence claim");
                    report.push(
                        claim.id,
                        &claim.subject,
                        PublishStatus::Skipped {
                            reason: format!("confidence {} below {}", claim.confidence, min),
                        },
                    );
                    continue;
                }
            }

            info!("Submitting claim {}/{}", i + 1, total);
            let status = match self.submit_claim(claim).await {
                Ok(response) => PublishStatus::Published { response },
                Err(e) => {
                    error!(subject = %claim.subject, error = %e, "Failed to submit claim");
                    PublishStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.push(claim.id, &claim.subject, status);
        }

        if report.failed() > 0 {
            warn!(failed = report.failed(), total, "Batch finished with failures");
        } else {
            info!(published = report.succeeded(), skipped = report.skipped(), "Batch published");
        }
        report
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("api_url", &self.api_url)
            .field("min_confidence", &self.min_confidence)
            .finish_non_exhaustive()
    }
}

/// Reject claims the registry would refuse
pub fn check_claim(claim: &Claim) -> Result<(), PublishError> {
    for (field, value) in [
        ("subject", &claim.subject),
        ("claim", &claim.claim_type),
        ("statement", &claim.statement),
    ] {
        if value.trim().is_empty() {
            return Err(PublishError::InvalidClaim(format!(
                "missing required field '{}'",
                field
            )));
        }
    }
    if !(0.0..=1.0).contains(&claim.confidence) {
        return Err(PublishError::InvalidClaim(format!(
            "confidence {} outside [0, 1]",
            claim.confidence
        )));
    }
    Ok(())
}

/// Wire payload for a claim, with registry defaults filled in
///
/// `effectiveDate` defaults to `today` and `howKnown` to `WEB_DOCUMENT`.
pub fn prepare_payload(claim: &Claim, today: NaiveDate) -> Result<Value, PublishError> {
    let mut payload = serde_json::to_value(claim.to_wire())?;

    if let Value::Object(fields) = &mut payload {
        fields
            .entry("effectiveDate")
            .or_insert_with(|| Value::String(today.format("%Y-%m-%d").to_string()));
        fields
            .entry("howKnown")
            .or_insert_with(|| Value::String(HowKnown::WebDocument.as_str().to_string()));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkedclaims_domain::ClaimId;
    use std::collections::BTreeSet;

    fn claim() -> Claim {
        Claim {
            id: ClaimId::new(),
            subject: "Gates Foundation".to_string(),
            claim_type: "impact".to_string(),
            object: None,
            statement: "Helped vaccinate over 10 million children in 2019".to_string(),
            aspect: Some("impact:social".to_string()),
            amount: Some(10_000_000.0),
            unit: Some("children".to_string()),
            effective_date: None,
            confidence: 0.9,
            source_uri: "https://example.org/report.pdf".to_string(),
            how_known: HowKnown::WebDocument,
            source_chunk_index: 0,
            supporting_chunks: BTreeSet::from([0]),
        }
    }

    #[test]
    fn test_payload_fills_effective_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let payload = prepare_payload(&claim(), today).unwrap();

        assert_eq!(payload["effectiveDate"], "2024-03-01");
        assert_eq!(payload["howKnown"], "WEB_DOCUMENT");
        assert_eq!(payload["claim"], "impact");
        assert_eq!(payload["amt"], 10_000_000.0);
        assert_eq!(payload["sourceURI"], "https://example.org/report.pdf");
        assert!(payload.get("id").is_none());
        assert!(payload.get("object").is_none());
    }

    #[test]
    fn test_payload_keeps_existing_date() {
        let mut claim = claim();
        claim.effective_date = NaiveDate::from_ymd_opt(2019, 12, 31);
        let payload = prepare_payload(&claim, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).unwrap();
        assert_eq!(payload["effectiveDate"], "2019-12-31");
    }

    #[test]
    fn test_check_claim() {
        assert!(check_claim(&claim()).is_ok());

        let mut missing = claim();
        missing.statement = "  ".to_string();
        assert!(matches!(check_claim(&missing), Err(PublishError::InvalidClaim(_))));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = RegistryClient::new(&PublisherConfig::default(), "");
        assert!(matches!(
            result,
            Err(PublishError::MissingCredentials(LINKEDTRUST_API_KEY_ENV))
        ));
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = PublisherConfig {
            api_url: "http://localhost:9000/api/".to_string(),
            ..PublisherConfig::default()
        };
        let client = RegistryClient::new(&config, "key").unwrap();
        assert_eq!(client.claims_endpoint(), "http://localhost:9000/api/v1/claims");
    }
}
