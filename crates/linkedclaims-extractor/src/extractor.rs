//! Core Extractor implementation

use crate::chunking::TextSegmenter;
use crate::config::{ExtractorConfig, PipelineConfig};
use crate::dedup::dedup_claims;
use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::prompt::PromptBuilder;
use crate::types::{ExtractionMetadata, ExtractionResult};
use chrono::Utc;
use linkedclaims_domain::traits::{DocumentSegmenter, LlmProvider};
use linkedclaims_domain::{
    Claim, DocumentChunk, ProviderError, Provenance, RejectionReason, RejectionRecord, Schema,
    SchemaRegistry,
};
use linkedclaims_gatekeeper::Gatekeeper;
use linkedclaims_llm::{build_client, client_for, LlmClient};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default completion budget per chunk
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// The Extractor turns document chunks into validated, deduplicated claims
///
/// Chunks are processed concurrently up to `concurrency_limit`. A failing
/// chunk becomes a rejection record and never stops the others; only an
/// unknown schema or a fatal provider error aborts the whole document.
#[derive(Debug, Clone)]
pub struct Extractor {
    client: LlmClient,
    registry: Arc<SchemaRegistry>,
    gatekeeper: Gatekeeper,
    config: ExtractorConfig,
    max_tokens: u32,
}

/// Work shared by every chunk task of one document
struct ChunkWorker {
    client: LlmClient,
    gatekeeper: Gatekeeper,
    schema: Schema,
    prompts: PromptBuilder,
    provenance: Provenance,
    max_tokens: u32,
    parse_retry_limit: u32,
}

/// What one chunk produced
#[derive(Debug, Default)]
struct ChunkOutput {
    claims: Vec<Claim>,
    rejections: Vec<RejectionRecord>,
    candidates: usize,
}

impl ChunkOutput {
    fn failed(chunk_index: usize, reason: RejectionReason) -> Self {
        Self {
            rejections: vec![RejectionRecord::for_chunk(chunk_index, reason)],
            ..Self::default()
        }
    }
}

impl Extractor {
    /// Create a new Extractor
    ///
    /// # Errors
    /// Returns error if the extractor configuration is invalid
    pub fn new(
        client: LlmClient,
        registry: SchemaRegistry,
        gatekeeper: Gatekeeper,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            client,
            registry: Arc::new(registry),
            gatekeeper,
            config,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Build an Extractor from a full pipeline configuration
    ///
    /// The provider credential is read from the environment.
    pub fn from_pipeline_config(
        config: &PipelineConfig,
        registry: SchemaRegistry,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let client = build_client(&config.provider)?;
        Self::assemble(client, config, registry)
    }

    /// Build an Extractor around an existing provider, using the pipeline's
    /// retry, timeout, validation, and extraction settings
    pub fn with_provider(
        provider: Arc<dyn LlmProvider>,
        config: &PipelineConfig,
        registry: SchemaRegistry,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let client = client_for(provider, &config.provider);
        Self::assemble(client, config, registry)
    }

    fn assemble(
        client: LlmClient,
        config: &PipelineConfig,
        registry: SchemaRegistry,
    ) -> Result<Self, ExtractorError> {
        let gatekeeper = Gatekeeper::new(config.validation.clone())?;
        Ok(Self::new(client, registry, gatekeeper, config.extraction.clone())?
            .with_max_tokens(config.provider.max_tokens))
    }

    /// Set the completion budget per chunk
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Registered schemas
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Active extraction settings
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Name of the model behind the client
    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Extract claims from pre-segmented chunks
    ///
    /// # Errors
    /// Returns error if `schema_name` is not registered or the provider
    /// reports a fatal error
    pub async fn extract_document(
        &self,
        chunks: Vec<DocumentChunk>,
        schema_name: &str,
        source_uri: &str,
    ) -> Result<ExtractionResult, ExtractorError> {
        self.extract_document_with_cancel(
            chunks,
            schema_name,
            Provenance::new(source_uri),
            CancellationToken::new(),
        )
        .await
    }

    /// Segment raw text with the built-in segmenter and extract from it
    pub async fn extract_text(
        &self,
        text: &str,
        schema_name: &str,
        source_uri: &str,
    ) -> Result<ExtractionResult, ExtractorError> {
        let segmenter = TextSegmenter::from_config(&self.config);
        self.extract_segmented(&segmenter, text, schema_name, source_uri)
            .await
    }

    /// Segment a document with `segmenter` and extract from it
    pub async fn extract_segmented<S>(
        &self,
        segmenter: &S,
        document: &str,
        schema_name: &str,
        source_uri: &str,
    ) -> Result<ExtractionResult, ExtractorError>
    where
        S: DocumentSegmenter + ?Sized,
    {
        let chunks = segmenter.segment(document);
        self.extract_document(chunks, schema_name, source_uri).await
    }

    /// Extract claims, stopping early when `cancel` fires
    ///
    /// On cancellation or when the document timeout elapses, in-flight chunks
    /// are abandoned and the claims of finished chunks are returned with
    /// `truncated` set.
    pub async fn extract_document_with_cancel(
        &self,
        chunks: Vec<DocumentChunk>,
        schema_name: &str,
        provenance: Provenance,
        cancel: CancellationToken,
    ) -> Result<ExtractionResult, ExtractorError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let schema = self.registry.get_schema(schema_name)?.clone();
        let chunks_total = chunks.len();

        info!(
            source = %provenance.source_uri,
            schema = %schema.name,
            chunks = chunks_total,
            model = self.client.model_name(),
            "Starting extraction"
        );

        let worker = Arc::new(ChunkWorker {
            client: self.client.clone(),
            gatekeeper: self.gatekeeper.clone(),
            prompts: PromptBuilder::new(&schema),
            schema,
            provenance: provenance.clone(),
            max_tokens: self.max_tokens,
            parse_retry_limit: self.config.parse_retry_limit,
        });
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit));

        // Outputs are keyed by (chunk index, spawn order) so chunks sharing an
        // index keep their own slot
        let mut pending = Vec::new();
        let mut tasks = JoinSet::new();
        for (slot, chunk) in chunks.into_iter().enumerate() {
            if chunk.text.trim().is_empty() {
                debug!(chunk = chunk.index, "Skipping blank chunk");
                continue;
            }
            let key = (chunk.index, slot);
            pending.push(key);

            let worker = Arc::clone(&worker);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    let reason = RejectionReason::ProviderFailure {
                        detail: "worker pool closed".to_string(),
                    };
                    return (key, Ok(ChunkOutput::failed(key.0, reason)));
                };
                (key, worker.run(chunk).await)
            });
        }

        let deadline = self.config.document_timeout();
        let expired = async move {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);

        let mut outputs: BTreeMap<(usize, usize), ChunkOutput> = BTreeMap::new();
        let mut truncated = false;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    warn!(completed = outputs.len(), "Extraction cancelled");
                    truncated = true;
                    break;
                }
                _ = &mut expired => {
                    warn!(completed = outputs.len(), ?deadline, "Document timeout elapsed");
                    truncated = true;
                    break;
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((key, Ok(output)))) => {
                        outputs.insert(key, output);
                    }
                    Some(Ok((_, Err(e)))) => {
                        error!(error = %e, "Aborting extraction");
                        tasks.abort_all();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "Chunk task failed");
                    }
                },
            }
        }
        tasks.abort_all();

        let chunks_completed = outputs.len();
        if !truncated {
            // A task that died without reporting still owes a record
            for key in pending {
                outputs.entry(key).or_insert_with(|| {
                    ChunkOutput::failed(
                        key.0,
                        RejectionReason::ProviderFailure {
                            detail: "chunk task terminated unexpectedly".to_string(),
                        },
                    )
                });
            }
        }

        let mut claims = Vec::new();
        let mut rejections = Vec::new();
        let mut candidates_parsed = 0;
        for output in outputs.into_values() {
            claims.extend(output.claims);
            rejections.extend(output.rejections);
            candidates_parsed += output.candidates;
        }

        let (claims, duplicates_merged) =
            dedup_claims(claims, self.config.dedup_similarity_threshold);

        let metadata = ExtractionMetadata {
            source_uri: provenance.source_uri,
            schema: schema_name.to_string(),
            model_name: self.client.model_name().to_string(),
            started_at,
            chunks_total,
            chunks_completed,
            candidates_parsed,
            duplicates_merged,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            claims = claims.len(),
            rejections = rejections.len(),
            duplicates = duplicates_merged,
            truncated,
            elapsed_ms = metadata.processing_time_ms,
            "Extraction complete"
        );

        Ok(ExtractionResult {
            claims,
            rejections,
            truncated,
            metadata,
        })
    }
}

impl ChunkWorker {
    /// Prompt, parse, and validate one chunk
    ///
    /// Only a fatal provider error is returned as `Err`; every other failure
    /// is recorded against the chunk.
    async fn run(&self, chunk: DocumentChunk) -> Result<ChunkOutput, ExtractorError> {
        let index = chunk.index;
        debug!(chunk = index, chars = chunk.text.len(), "Processing chunk");

        let mut reasks = 0;
        loop {
            let prompt = if reasks == 0 {
                self.prompts.build(&chunk.text)
            } else {
                self.prompts.build_retry(&chunk.text)
            };

            let raw = match self.client.generate(&prompt, self.max_tokens).await {
                Ok(raw) => raw,
                Err(e @ ProviderError::Fatal(_)) => {
                    return Err(ExtractorError::Provider {
                        chunk_index: index,
                        source: e,
                    })
                }
                Err(e) => {
                    warn!(chunk = index, error = %e, "Provider retries exhausted");
                    return Ok(ChunkOutput::failed(
                        index,
                        RejectionReason::ProviderFailure {
                            detail: e.message().to_string(),
                        },
                    ));
                }
            };

            let parsed = match parse_response(&raw, index) {
                Ok(parsed) => parsed,
                Err(e) if reasks < self.parse_retry_limit => {
                    reasks += 1;
                    warn!(chunk = index, attempt = reasks, error = %e, "Re-asking after unparseable response");
                    continue;
                }
                Err(e) => {
                    warn!(chunk = index, error = %e, "Giving up on unparseable response");
                    return Ok(ChunkOutput::failed(index, e.into()));
                }
            };

            let (claims, rejected) =
                self.gatekeeper
                    .validate_all(&parsed.candidates, &self.schema, &self.provenance);

            debug!(
                chunk = index,
                candidates = parsed.candidates.len(),
                accepted = claims.len(),
                rejected = rejected.len() + parsed.rejections.len(),
                "Chunk finished"
            );

            let mut rejections = parsed.rejections;
            rejections.extend(rejected);
            return Ok(ChunkOutput {
                claims,
                rejections,
                candidates: parsed.candidates.len(),
            });
        }
    }
}
