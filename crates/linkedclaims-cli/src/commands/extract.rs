//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use linkedclaims_domain::traits::DocumentSegmenter;
use linkedclaims_domain::Provenance;
use linkedclaims_extractor::{
    CancellationToken, ExtractionResult, Extractor, PipelineConfig, TextSegmenter,
};
use std::fs;
use std::io::{self, Read};
use tracing::{info, warn};

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let (text, default_uri) = read_input(&args).await?;
    let source_uri = args.source_uri.clone().unwrap_or(default_uri);

    let pipeline = pipeline_for(&args, config);
    let extractor = Extractor::from_pipeline_config(&pipeline, config.schema_registry()?)?;

    // Ctrl-C stops outstanding chunks; finished ones are still reported
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, keeping claims from finished chunks");
                cancel.cancel();
            }
        })
    };
    let result = run_extraction(&extractor, &text, &args.schema, &source_uri, cancel).await;
    interrupt.abort();
    let result = result?;

    if let Some(path) = &args.output {
        fs::write(path, result.to_json_pretty()?)?;
        eprintln!(
            "{}",
            formatter.success(&format!("Saved extraction result to {}", path.display()))
        );
    }

    println!("{}", formatter.format_result(&result)?);
    Ok(())
}

/// Segment `text` and run it through the extractor.
pub async fn run_extraction(
    extractor: &Extractor,
    text: &str,
    schema: &str,
    source_uri: &str,
    cancel: CancellationToken,
) -> Result<ExtractionResult> {
    let chunks = TextSegmenter::from_config(extractor.config()).segment(text);
    if chunks.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "document has no chunk with at least {} characters of text",
            extractor.config().min_chunk_chars
        )));
    }
    info!(chunks = chunks.len(), source_uri, "Document segmented");

    let result = extractor
        .extract_document_with_cancel(chunks, schema, Provenance::new(source_uri), cancel)
        .await?;
    Ok(result)
}

/// Pipeline configuration with command-line overrides applied.
pub fn pipeline_for(args: &ExtractArgs, config: &Config) -> PipelineConfig {
    let mut pipeline = config.pipeline();
    if let Some(provider) = args.provider {
        pipeline.provider.kind = provider.into();
        // Another backend's model name would not resolve
        pipeline.provider.model_name.clear();
    }
    if let Some(model) = &args.model {
        pipeline.provider.model_name = model.clone();
    }
    if let Some(concurrency) = args.concurrency {
        pipeline.extraction.concurrency_limit = concurrency;
    }
    pipeline
}

/// Read the document text and its default source URI.
async fn read_input(args: &ExtractArgs) -> Result<(String, String)> {
    if let Some(path) = &args.file {
        let text = fs::read_to_string(path)?;
        let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        Ok((text, format!("file://{}", absolute.display())))
    } else if let Some(url) = &args.url {
        info!(url = %url, "Fetching document");
        let text = reqwest::get(url)
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok((text, url.clone()))
    } else if let Some(text) = &args.text {
        Ok((text.clone(), "urn:linkedclaims:inline".to_string()))
    } else if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok((buffer, "urn:linkedclaims:stdin".to_string()))
    } else {
        Err(CliError::InvalidInput(
            "Must specify one of --file, --url, --text or --stdin".to_string(),
        ))
    }
}
