//! Publisher tests against an in-process registry
//!
//! The registry is a small axum app bound to an ephemeral local port that
//! records every request it receives.

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use linkedclaims_domain::{Claim, ClaimId, HowKnown};
use linkedclaims_extractor::{ExtractionMetadata, ExtractionResult};
use linkedclaims_publisher::{
    PublishError, PublishStatus, PublisherConfig, RegistryClient, ReviewQueue, ReviewStatus,
};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Received(Arc<Mutex<Vec<(Option<String>, Value)>>>);

impl Received {
    fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.0.lock().unwrap().clone()
    }
}

async fn create_claim(
    State(received): State<Received>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if auth.as_deref() != Some("Bearer test-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid token"})));
    }

    let reject = body["subject"] == "Rejected Org";
    let mut requests = received.0.lock().unwrap();
    requests.push((auth, body));

    if reject {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "subject is not a valid entity"})),
        )
    } else {
        (StatusCode::CREATED, Json(json!({"id": requests.len()})))
    }
}

async fn spawn_registry() -> (String, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/api/v1/claims", post(create_claim))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), received)
}

fn claim(subject: &str, confidence: f64) -> Claim {
    Claim {
        id: ClaimId::new(),
        subject: subject.to_string(),
        claim_type: "impact".to_string(),
        object: None,
        statement: format!("{} provided 500 meals to families", subject),
        aspect: Some("impact:social".to_string()),
        amount: Some(500.0),
        unit: Some("meals".to_string()),
        effective_date: None,
        confidence,
        source_uri: "https://example.org/report.pdf".to_string(),
        how_known: HowKnown::WebDocument,
        source_chunk_index: 0,
        supporting_chunks: BTreeSet::from([0]),
    }
}

fn client(api_url: &str, key: &str) -> RegistryClient {
    let config = PublisherConfig {
        api_url: api_url.to_string(),
        ..PublisherConfig::default()
    };
    RegistryClient::new(&config, key).unwrap()
}

#[tokio::test]
async fn test_publish_batch_continues_past_failures() {
    let (api_url, received) = spawn_registry().await;
    let client = client(&api_url, "test-key");

    let claims = vec![
        claim("Food Bank", 0.9),
        claim("Rejected Org", 0.9),
        claim("Clinic", 0.8),
    ];
    let report = client.publish_batch(&claims).await;

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());
    assert_eq!(report.outcomes[1].claim_id, claims[1].id);
    match &report.outcomes[1].status {
        PublishStatus::Failed { error } => assert!(error.contains("422"), "{}", error),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(report.outcomes[2].is_published());

    let requests = received.requests();
    assert_eq!(requests.len(), 3);

    let (auth, payload) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(payload["claim"], "impact");
    assert_eq!(payload["howKnown"], "WEB_DOCUMENT");
    assert_eq!(payload["sourceURI"], "https://example.org/report.pdf");
    assert_eq!(
        payload["effectiveDate"],
        Utc::now().date_naive().format("%Y-%m-%d").to_string()
    );
}

#[tokio::test]
async fn test_submit_returns_registry_response() {
    let (api_url, _) = spawn_registry().await;
    let response = client(&api_url, "test-key")
        .submit_claim(&claim("Food Bank", 0.9))
        .await
        .unwrap();
    assert_eq!(response["id"], 1);
}

#[tokio::test]
async fn test_min_confidence_skips_claims() {
    let (api_url, received) = spawn_registry().await;
    let config = PublisherConfig {
        api_url,
        min_confidence: Some(0.8),
        ..PublisherConfig::default()
    };
    let client = RegistryClient::new(&config, "test-key").unwrap();

    let report = client
        .publish_batch(&[claim("Food Bank", 0.9), claim("Clinic", 0.5)])
        .await;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.skipped(), 1);
    assert!(report.is_success());
    assert_eq!(received.requests().len(), 1);
}

#[tokio::test]
async fn test_bad_key_is_auth_error() {
    let (api_url, received) = spawn_registry().await;
    let result = client(&api_url, "wrong-key")
        .submit_claim(&claim("Food Bank", 0.9))
        .await;

    assert!(matches!(result, Err(PublishError::Auth(_))));
    assert!(received.requests().is_empty());
}

#[tokio::test]
async fn test_unreachable_registry() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(&format!("http://{}/api", addr), "test-key")
        .submit_claim(&claim("Food Bank", 0.9))
        .await;

    assert!(matches!(result, Err(PublishError::Connection(_))));
}

#[tokio::test]
async fn test_invalid_claim_not_sent() {
    let (api_url, received) = spawn_registry().await;
    let mut bad = claim("Food Bank", 0.9);
    bad.subject = String::new();

    let result = client(&api_url, "test-key").submit_claim(&bad).await;
    assert!(matches!(result, Err(PublishError::InvalidClaim(_))));
    assert!(received.requests().is_empty());
}

#[tokio::test]
async fn test_review_queue_to_registry() {
    let (api_url, received) = spawn_registry().await;

    let result = ExtractionResult {
        claims: vec![claim("Food Bank", 0.9), claim("Clinic", 0.6)],
        rejections: vec![],
        truncated: false,
        metadata: ExtractionMetadata {
            source_uri: "https://example.org/report.pdf".to_string(),
            schema: "impact".to_string(),
            model_name: "mock".to_string(),
            started_at: Utc::now(),
            chunks_total: 1,
            chunks_completed: 1,
            candidates_parsed: 2,
            duplicates_merged: 0,
            processing_time_ms: 3,
        },
    };

    let mut queue = ReviewQueue::new();
    assert_eq!(queue.enqueue(&result), 2);
    queue.approve(result.claims[0].id).unwrap();
    queue.reject(result.claims[1].id, "figure not in source").unwrap();

    // Persist and reload between review and publishing
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");
    queue.save(&path).unwrap();
    let mut queue = ReviewQueue::load(&path).unwrap();

    let approved = queue.drain_approved();
    let report = client(&api_url, "test-key").publish_batch(&approved).await;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(received.requests()[0].1["subject"], "Food Bank");
    assert_eq!(queue.len(), 1);
    assert!(matches!(
        queue.get(result.claims[1].id).unwrap().status,
        ReviewStatus::Rejected { .. }
    ));
}
