//! Publish command implementation.

use crate::cli::PublishArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use chrono::{NaiveDate, Utc};
use linkedclaims_domain::Claim;
use linkedclaims_extractor::ExtractionResult;
use linkedclaims_publisher::{check_claim, prepare_payload, PublisherConfig, RegistryClient};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::info;

/// Execute the publish command.
pub async fn execute_publish(args: PublishArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let result = read_result(args.input.as_deref())?;
    let publisher = publisher_config(&args, config)?;

    if result.truncated {
        eprintln!(
            "{}",
            formatter.warning("Extraction result is truncated; some chunks produced no claims")
        );
    }
    if result.claims.is_empty() {
        eprintln!("{}", formatter.warning("No claims to publish"));
        return Ok(());
    }

    if args.dry_run {
        let claims: Vec<&Claim> = match publisher.min_confidence {
            Some(min) => result.claims_above(min).collect(),
            None => result.claims.iter().collect(),
        };
        let payloads = dry_run_payloads(&claims, Utc::now().date_naive())?;
        println!("{}", formatter.format_payloads(&payloads)?);
        eprintln!(
            "{}",
            formatter.info(&format!(
                "Dry run: {} of {} claim(s) would be submitted to {}",
                payloads.len(),
                result.claims.len(),
                publisher.api_url
            ))
        );
        return Ok(());
    }

    let client = RegistryClient::from_env(&publisher)?;
    info!(claims = result.claims.len(), endpoint = %client.claims_endpoint(), "Publishing claims");
    let report = client.publish_batch(&result.claims).await;
    println!("{}", formatter.format_report(&report)?);

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::PublishIncomplete {
            failed: report.failed(),
            total: report.total(),
        })
    }
}

/// Registry settings with command-line overrides applied.
pub fn publisher_config(args: &PublishArgs, config: &Config) -> Result<PublisherConfig> {
    let mut publisher = config.publisher.clone();
    if let Some(url) = &args.api_url {
        publisher.api_url = url.clone();
    }
    if args.min_confidence.is_some() {
        publisher.min_confidence = args.min_confidence;
    }
    publisher.validate().map_err(CliError::InvalidInput)?;
    Ok(publisher)
}

/// Registry payloads for claims, without sending anything.
pub fn dry_run_payloads(claims: &[&Claim], today: NaiveDate) -> Result<Vec<Value>> {
    claims
        .iter()
        .map(|claim| {
            check_claim(claim)?;
            Ok(prepare_payload(claim, today)?)
        })
        .collect()
}

fn read_result(input: Option<&Path>) -> Result<ExtractionResult> {
    let json = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(ExtractionResult::from_json(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use chrono::Utc;
    use clap::Parser;
    use linkedclaims_domain::{ClaimId, HowKnown};
    use linkedclaims_extractor::ExtractionMetadata;
    use std::collections::BTreeSet;

    fn claim(subject: &str, confidence: f64) -> Claim {
        Claim {
            id: ClaimId::new(),
            subject: subject.to_string(),
            claim_type: "impact".to_string(),
            object: None,
            statement: format!("{} trained 40 community health workers", subject),
            aspect: Some("impact:social".to_string()),
            amount: Some(40.0),
            unit: Some("workers".to_string()),
            effective_date: None,
            confidence,
            source_uri: "https://example.org/report".to_string(),
            how_known: HowKnown::WebDocument,
            source_chunk_index: 0,
            supporting_chunks: BTreeSet::from([0]),
        }
    }

    fn result(claims: Vec<Claim>) -> ExtractionResult {
        ExtractionResult {
            claims,
            rejections: vec![],
            truncated: false,
            metadata: ExtractionMetadata {
                source_uri: "https://example.org/report".to_string(),
                schema: "impact".to_string(),
                model_name: "mock".to_string(),
                started_at: Utc::now(),
                chunks_total: 1,
                chunks_completed: 1,
                candidates_parsed: 2,
                duplicates_merged: 0,
                processing_time_ms: 5,
            },
        }
    }

    fn publish_args(argv: &[&str]) -> PublishArgs {
        let mut full = vec!["linkedclaims", "publish"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Publish(args) => args,
            _ => panic!("Expected Publish command"),
        }
    }

    #[test]
    fn test_dry_run_payloads() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let a = claim("Health Alliance", 0.9);
        let payloads = dry_run_payloads(&[&a], today).unwrap();

        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0]["subject"], "Health Alliance");
        assert_eq!(payloads[0]["effectiveDate"], "2024-06-30");
        assert_eq!(payloads[0]["howKnown"], "WEB_DOCUMENT");
    }

    #[test]
    fn test_dry_run_rejects_incomplete_claim() {
        let mut bad = claim("Health Alliance", 0.9);
        bad.subject.clear();
        let err = dry_run_payloads(&[&bad], Utc::now().date_naive()).unwrap_err();
        assert!(matches!(err, CliError::Publish(_)));
    }

    #[test]
    fn test_min_confidence_flag_overrides_config() {
        let mut config = Config::default();
        config.publisher.min_confidence = Some(0.5);

        let publisher = publisher_config(&publish_args(&["--min-confidence", "0.8"]), &config).unwrap();
        assert_eq!(publisher.min_confidence, Some(0.8));

        let publisher = publisher_config(&publish_args(&[]), &config).unwrap();
        assert_eq!(publisher.min_confidence, Some(0.5));
    }

    #[test]
    fn test_out_of_range_min_confidence() {
        let err = publisher_config(&publish_args(&["--min-confidence", "1.5"]), &Config::default())
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[test]
    fn test_read_saved_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let saved = result(vec![claim("Health Alliance", 0.9), claim("Clinic", 0.4)]);
        fs::write(&path, saved.to_json_pretty().unwrap()).unwrap();

        let loaded = read_result(Some(&path)).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.claims_above(0.5).count(), 1);
    }

    #[test]
    fn test_read_malformed_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        fs::write(&path, "{\"claims\": 3}").unwrap();
        assert!(matches!(read_result(Some(&path)), Err(CliError::Serialization(_))));
    }
}
