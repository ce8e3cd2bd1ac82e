//! Pipeline tests for the Extractor

use crate::{
    parse_response, CancellationToken, Extractor, ExtractorConfig, ExtractorError, PipelineConfig,
};
use chrono::NaiveDate;
use linkedclaims_domain::{
    DocumentChunk, HowKnown, ProviderError, Provenance, RejectionReason, SchemaRegistry,
};
use linkedclaims_gatekeeper::Gatekeeper;
use linkedclaims_llm::{LlmClient, MockProvider, RetryPolicy};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

const SOURCE: &str = "https://example.org/annual-report.pdf";

fn extractor_with(provider: &MockProvider, config: ExtractorConfig) -> Extractor {
    let client =
        LlmClient::new(Arc::new(provider.clone())).with_retry_policy(RetryPolicy::immediate(3));
    Extractor::new(
        client,
        SchemaRegistry::with_builtin(),
        Gatekeeper::default_config(),
        config,
    )
    .unwrap()
}

fn extractor(provider: &MockProvider) -> Extractor {
    extractor_with(provider, ExtractorConfig::default())
}

fn one_claim(subject: &str, statement: &str, confidence: f64) -> String {
    json!([{
        "subject": subject,
        "claim": "impact",
        "statement": statement,
        "confidence": confidence
    }])
    .to_string()
}

fn marked_chunks(indices: impl IntoIterator<Item = usize>) -> Vec<DocumentChunk> {
    indices
        .into_iter()
        .map(|i| DocumentChunk::new(i, format!("CHUNK-{} of the annual report", i)))
        .collect()
}

#[tokio::test]
async fn test_end_to_end_donation() {
    let provider = MockProvider::new(
        r#"[{"subject":"Our foundation","claim":"impact","statement":"Donated to malaria research","aspect":"impact:financial","amt":2000000,"unit":"USD","confidence":0.92,"effectiveDate":"2022-12-31"}]"#,
    );
    let extractor = extractor(&provider);

    let chunks = vec![DocumentChunk::new(
        0,
        "Our foundation donated $2,000,000 to malaria research in 2022",
    )];
    let result = extractor
        .extract_document(chunks, "impact", SOURCE)
        .await
        .unwrap();

    assert!(result.rejections.is_empty());
    assert!(!result.truncated);
    assert_eq!(result.claims.len(), 1);

    let claim = &result.claims[0];
    assert_eq!(claim.subject, "Our foundation");
    assert_eq!(claim.claim_type, "impact");
    assert_eq!(claim.statement, "Donated to malaria research");
    assert_eq!(claim.aspect.as_deref(), Some("impact:financial"));
    assert_eq!(claim.amount, Some(2_000_000.0));
    assert_eq!(claim.unit.as_deref(), Some("USD"));
    assert_eq!(claim.confidence, 0.92);
    assert_eq!(claim.effective_date, NaiveDate::from_ymd_opt(2022, 12, 31));
    assert_eq!(claim.source_uri, SOURCE);
    assert_eq!(claim.how_known, HowKnown::WebDocument);

    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("Our foundation donated $2,000,000 to malaria research in 2022"));
}

#[tokio::test]
async fn test_exhausted_retries_isolated_to_chunk() {
    let mut provider = MockProvider::default();
    provider.fail_containing("CHUNK-3", ProviderError::Transient("503 overloaded".into()));
    for i in [1, 2, 4, 5] {
        provider.respond_containing(
            format!("CHUNK-{}", i),
            one_claim(&format!("Org {}", i), &format!("Org {} planted trees", i), 0.9),
        );
    }
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks(1..=5), "impact", SOURCE)
        .await
        .unwrap();

    assert!(!result.truncated);
    let chunks: Vec<usize> = result.claims.iter().map(|c| c.source_chunk_index).collect();
    assert_eq!(chunks, vec![1, 2, 4, 5]);

    assert_eq!(result.rejections.len(), 1);
    let rejection = &result.rejections[0];
    assert_eq!(rejection.chunk_index, 3);
    assert!(matches!(
        rejection.reason,
        RejectionReason::ProviderFailure { ref detail } if detail.contains("503")
    ));
    assert_eq!(result.failed_chunks(), vec![3]);

    // Four successes plus three attempts on chunk 3
    assert_eq!(provider.call_count(), 7);
}

#[tokio::test]
async fn test_transient_failure_recovers_on_retry() {
    let mut provider = MockProvider::default();
    provider.script_containing(
        "CHUNK-0",
        vec![
            Err(ProviderError::Transient("429 rate limited".into())),
            Ok(one_claim("Acme", "Acme planted 500 trees", 0.8)),
        ],
    );
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks([0]), "impact", SOURCE)
        .await
        .unwrap();

    assert_eq!(result.claims.len(), 1);
    assert!(result.rejections.is_empty());
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_fatal_provider_error_aborts() {
    let mut provider = MockProvider::default();
    provider.fail_containing("CHUNK-2", ProviderError::Fatal("401 invalid x-api-key".into()));
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks(0..4), "impact", SOURCE)
        .await;

    match result {
        Err(ExtractorError::Provider { chunk_index, source }) => {
            assert_eq!(chunk_index, 2);
            assert!(!source.is_transient());
        }
        other => panic!("expected fatal provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cross_chunk_duplicates_merged() {
    let mut provider = MockProvider::default();
    provider.respond_containing(
        "CHUNK-0",
        one_claim("Food Bank", "Provided 500 meals to families", 0.7),
    );
    provider.respond_containing(
        "CHUNK-1",
        one_claim("Food Bank", "provided 500 meals to families.", 0.9),
    );
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks(0..2), "impact", SOURCE)
        .await
        .unwrap();

    assert_eq!(result.claims.len(), 1);
    let claim = &result.claims[0];
    assert_eq!(claim.confidence, 0.9);
    assert_eq!(claim.statement, "provided 500 meals to families.");
    assert_eq!(claim.supporting_chunks, BTreeSet::from([0, 1]));
    assert_eq!(result.metadata.duplicates_merged, 1);
}

#[tokio::test]
async fn test_unparseable_response_reasked_once() {
    let mut provider = MockProvider::default();
    provider.script_containing(
        "CHUNK-0",
        vec![
            Ok("I'm sorry, I can't format that.".to_string()),
            Ok(one_claim("Acme", "Acme planted 500 trees", 0.8)),
        ],
    );
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks([0]), "impact", SOURCE)
        .await
        .unwrap();

    assert_eq!(result.claims.len(), 1);
    assert!(result.rejections.is_empty());

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("could not be parsed"));
    assert!(prompts[1].contains("could not be parsed"));
}

#[tokio::test]
async fn test_unparseable_response_recorded() {
    let mut provider = MockProvider::default();
    provider.respond_containing("CHUNK-1", "No claims here, sorry.");
    provider.respond_containing("CHUNK-0", one_claim("Acme", "Acme planted 500 trees", 0.8));
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks(0..2), "impact", SOURCE)
        .await
        .unwrap();

    assert_eq!(result.claims.len(), 1);
    assert_eq!(result.rejections.len(), 1);
    assert_eq!(result.rejections[0].chunk_index, 1);
    assert!(matches!(
        result.rejections[0].reason,
        RejectionReason::UnparseableResponse { .. }
    ));
    // One original call and one re-ask for chunk 1
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_no_reask_when_disabled() {
    let provider = MockProvider::new("not json at all");
    let config = ExtractorConfig {
        parse_retry_limit: 0,
        ..ExtractorConfig::default()
    };
    let extractor = extractor_with(&provider, config);

    let result = extractor
        .extract_document(marked_chunks([0]), "impact", SOURCE)
        .await
        .unwrap();

    assert_eq!(result.failed_chunks(), vec![0]);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_candidate_rejections_carry_chunk_and_field() {
    let provider = MockProvider::new(
        json!([
            {"subject": "Acme", "claim": "impact", "statement": "Acme trained 20 teachers", "amt": 20, "unit": "people", "confidence": 0.8},
            {"claim": "impact", "statement": "Someone planted trees", "confidence": 0.8},
            {"subject": "Acme", "claim": "impact", "statement": "Acme fed 500", "amt": 500, "confidence": 0.8},
            "stray string"
        ])
        .to_string(),
    );
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks([4]), "impact", SOURCE)
        .await
        .unwrap();

    assert_eq!(result.claims.len(), 1);
    assert_eq!(result.claims[0].unit.as_deref(), Some("people"));
    assert_eq!(result.metadata.candidates_parsed, 3);

    let reasons: Vec<&RejectionReason> = result.rejections.iter().map(|r| &r.reason).collect();
    assert_eq!(reasons.len(), 3);
    assert!(result.rejections.iter().all(|r| r.chunk_index == 4));
    assert!(reasons
        .iter()
        .any(|r| matches!(r, RejectionReason::NotAnObject { .. })));
    assert!(reasons.iter().any(|r| matches!(
        r,
        RejectionReason::MissingRequiredField { field } if field == "subject"
    )));
    assert!(reasons
        .iter()
        .any(|r| matches!(r, RejectionReason::InconsistentAmountUnit)));
}

#[tokio::test]
async fn test_model_provenance_ignored() {
    let provider = MockProvider::new(
        json!([{
            "subject": "Acme",
            "claim": "impact",
            "statement": "Acme planted 500 trees",
            "sourceURI": "https://attacker.example",
            "howKnown": "FIRST_HAND"
        }])
        .to_string(),
    );
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks([0]), "impact", SOURCE)
        .await
        .unwrap();

    let claim = &result.claims[0];
    assert_eq!(claim.source_uri, SOURCE);
    assert_eq!(claim.how_known, HowKnown::WebDocument);
    assert_eq!(claim.confidence, 0.5);
}

#[tokio::test(start_paused = true)]
async fn test_claims_ordered_by_chunk_despite_completion_order() {
    let mut provider = MockProvider::default();
    provider.respond_containing("CHUNK-0", one_claim("Acme", "Acme planted 500 trees", 0.8));
    provider.delay_containing("CHUNK-0", Duration::from_secs(10));
    provider.respond_containing("CHUNK-1", one_claim("Acme", "Acme trained 20 teachers", 0.8));
    provider.respond_containing("CHUNK-2", one_claim("Acme", "Acme opened a clinic", 0.8));
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks(0..3), "impact", SOURCE)
        .await
        .unwrap();

    let statements: Vec<&str> = result.claims.iter().map(|c| c.statement.as_str()).collect();
    assert_eq!(
        statements,
        vec![
            "Acme planted 500 trees",
            "Acme trained 20 teachers",
            "Acme opened a clinic"
        ]
    );
}

#[tokio::test]
async fn test_chunks_sharing_an_index_keep_their_claims() {
    let mut provider = MockProvider::default();
    provider.respond_containing("FIRST-HALF", one_claim("Acme", "Acme planted 500 trees", 0.8));
    provider.respond_containing("SECOND-HALF", one_claim("Globex", "Globex trained 20 nurses", 0.7));
    let extractor = extractor(&provider);

    let chunks = vec![
        DocumentChunk::new(0, "FIRST-HALF of the annual report"),
        DocumentChunk::new(0, "SECOND-HALF of the annual report"),
    ];
    let result = extractor
        .extract_document(chunks, "impact", SOURCE)
        .await
        .unwrap();

    assert_eq!(result.metadata.chunks_completed, 2);
    let subjects: Vec<&str> = result.claims.iter().map(|c| c.subject.as_str()).collect();
    assert_eq!(subjects, vec!["Acme", "Globex"]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_limit_bounds_parallel_calls() {
    let mut provider = MockProvider::default();
    provider.delay_containing("CHUNK-", Duration::from_secs(10));
    let config = ExtractorConfig {
        concurrency_limit: 2,
        ..ExtractorConfig::default()
    };
    let extractor = extractor_with(&provider, config);

    let start = tokio::time::Instant::now();
    extractor
        .extract_document(marked_chunks(0..4), "impact", SOURCE)
        .await
        .unwrap();
    let elapsed = start.elapsed();

    // Two waves of two chunks
    assert!(elapsed >= Duration::from_secs(20), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(30), "{:?}", elapsed);
    assert_eq!(provider.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_document_timeout_returns_partial_result() {
    let mut provider = MockProvider::default();
    provider.respond_containing("CHUNK-0", one_claim("Acme", "Acme planted 500 trees", 0.8));
    provider.respond_containing("CHUNK-1", one_claim("Acme", "Acme trained 20 teachers", 0.8));
    provider.respond_containing("CHUNK-2", one_claim("Acme", "Acme opened a clinic", 0.8));
    provider.delay_containing("CHUNK-2", Duration::from_secs(600));
    let config = ExtractorConfig {
        document_timeout_secs: Some(5),
        ..ExtractorConfig::default()
    };
    let extractor = extractor_with(&provider, config);

    let result = extractor
        .extract_document(marked_chunks(0..3), "impact", SOURCE)
        .await
        .unwrap();

    assert!(result.truncated);
    assert_eq!(result.claims.len(), 2);
    assert!(result.rejections.is_empty());
    assert_eq!(result.metadata.chunks_total, 3);
    assert_eq!(result.metadata.chunks_completed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_preserves_completed_chunks() {
    let mut provider = MockProvider::default();
    provider.respond_containing("CHUNK-0", one_claim("Acme", "Acme planted 500 trees", 0.8));
    provider.respond_containing("CHUNK-1", one_claim("Acme", "Acme opened a clinic", 0.8));
    provider.delay_containing("CHUNK-1", Duration::from_secs(30));
    let extractor = extractor(&provider);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let result = extractor
        .extract_document_with_cancel(
            marked_chunks(0..2),
            "impact",
            Provenance::new(SOURCE),
            cancel,
        )
        .await
        .unwrap();

    assert!(result.truncated);
    assert_eq!(result.claims.len(), 1);
    assert_eq!(result.claims[0].source_chunk_index, 0);
}

#[tokio::test]
async fn test_rated_schema_requires_aspect() {
    let provider = MockProvider::new(
        json!([
            {"subject": "Clinic", "claim": "rated", "statement": "Rated highly", "aspect": "quality:service", "confidence": 0.7},
            {"subject": "Clinic", "claim": "rated", "statement": "Rated poorly", "confidence": 0.7}
        ])
        .to_string(),
    );
    let extractor = extractor(&provider);

    let result = extractor
        .extract_document(marked_chunks([0]), "rated", SOURCE)
        .await
        .unwrap();

    assert_eq!(result.claims.len(), 1);
    assert_eq!(result.claims[0].claim_type, "rated");
    assert!(matches!(
        &result.rejections[0].reason,
        RejectionReason::MissingRequiredField { field } if field == "aspect"
    ));
}

#[test]
fn test_extract_text_splits_pages() {
    let mut provider = MockProvider::default();
    provider.respond_containing(
        "second page",
        one_claim("Acme", "Acme planted 500 trees", 0.8),
    );
    let extractor = extractor_with(
        &provider,
        ExtractorConfig {
            min_chunk_chars: 10,
            ..ExtractorConfig::default()
        },
    );

    let document = "The first page has an introduction.\u{0C}tiny\u{0C}The second page has the impact numbers.";
    let result = tokio_test::block_on(extractor.extract_text(document, "impact", SOURCE)).unwrap();

    assert_eq!(provider.call_count(), 2);
    assert_eq!(result.claims.len(), 1);
    assert_eq!(result.claims[0].source_chunk_index, 2);
}

#[test]
fn test_pipeline_config_with_mock_provider() {
    let config = PipelineConfig::from_toml(
        r#"
        [provider]
        kind = "mock"
        max_tokens = 512

        [extraction]
        concurrency_limit = 1

        [validation]
        default_confidence = 0.3
        "#,
    )
    .unwrap();

    let provider = MockProvider::new(
        json!([{"subject": "Acme", "claim": "impact", "statement": "Acme planted 500 trees"}])
            .to_string(),
    );
    let extractor =
        Extractor::with_provider(Arc::new(provider), &config, SchemaRegistry::with_builtin())
            .unwrap();
    assert_eq!(extractor.config().concurrency_limit, 1);

    let result = tokio_test::block_on(extractor.extract_document(
        marked_chunks([0]),
        "impact",
        SOURCE,
    ))
    .unwrap();
    assert_eq!(result.claims[0].confidence, 0.3);
}

#[test]
fn test_result_json_round_trip() {
    let provider = MockProvider::new(one_claim("Acme", "Acme planted 500 trees", 0.8));
    let extractor = extractor(&provider);
    let result = tokio_test::block_on(extractor.extract_document(
        marked_chunks([0]),
        "impact",
        SOURCE,
    ))
    .unwrap();

    let json = result.to_json_pretty().unwrap();
    assert!(json.contains("\"sourceURI\""));
    let parsed = crate::ExtractionResult::from_json(&json).unwrap();
    assert_eq!(parsed, result);
}

proptest! {
    #[test]
    fn prop_truncated_prefix_never_fails(cut in 1usize..200) {
        let full = json!([
            {"subject": "Acme", "claim": "impact", "statement": "planted 500 trees", "confidence": 0.9},
            {"subject": "Globex", "claim": "impact", "statement": "trained 20 people", "amt": 20},
            {"subject": "Initech", "claim": "impact", "statement": "opened a clinic"}
        ])
        .to_string();
        let cut = cut.min(full.len());
        let prefix = &full[..cut];

        let parsed = parse_response(prefix, 0).unwrap();
        prop_assert!(parsed.candidates.len() <= 3);
        prop_assert!(parsed.rejections.is_empty());

        let expected = ["Acme", "Globex", "Initech"];
        for (candidate, subject) in parsed.candidates.iter().zip(expected) {
            let got = candidate.text("subject");
            prop_assert_eq!(got.as_deref(), Some(subject));
        }
    }
}
