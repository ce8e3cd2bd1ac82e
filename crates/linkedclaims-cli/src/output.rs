//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use linkedclaims_domain::{Claim, RejectionRecord, Schema};
use linkedclaims_extractor::ExtractionResult;
use linkedclaims_publisher::{PublishReport, PublishStatus};
use serde_json::Value;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest statement shown in a table cell
const STATEMENT_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an extraction result.
    pub fn format_result(&self, result: &ExtractionResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(result.to_json_pretty()?),
            OutputFormat::Table => Ok(self.format_result_table(result)),
            OutputFormat::Quiet => Ok(ids(&result.claims)),
        }
    }

    fn format_result_table(&self, result: &ExtractionResult) -> String {
        let mut sections = Vec::new();

        if result.claims.is_empty() {
            sections.push(self.colorize("No claims found.", "yellow"));
        } else {
            sections.push(claims_table(&result.claims));
        }

        if !result.rejections.is_empty() {
            sections.push(self.colorize(
                &format!("{} rejection(s):", result.rejections.len()),
                "yellow",
            ));
            sections.push(rejections_table(&result.rejections));
        }

        let meta = &result.metadata;
        let summary = format!(
            "{} claim(s) from {}/{} chunk(s) of {} [{} · {}] in {} ms, {} duplicate(s) merged",
            result.claims.len(),
            meta.chunks_completed,
            meta.chunks_total,
            meta.source_uri,
            meta.schema,
            meta.model_name,
            meta.processing_time_ms,
            meta.duplicates_merged,
        );
        sections.push(self.info(&summary));

        if result.truncated {
            sections.push(self.warning("Extraction was truncated before every chunk finished"));
        }

        sections.join("\n")
    }

    /// Format registered schemas.
    pub fn format_schemas(&self, schemas: &[&Schema]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(schemas)?),
            OutputFormat::Quiet => Ok(schemas
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if schemas.is_empty() {
                    return Ok(self.colorize("No schemas registered.", "yellow"));
                }
                let sections: Vec<String> = schemas
                    .iter()
                    .map(|schema| {
                        let title = format!(
                            "{} (v{}): {}",
                            schema.name, schema.version, schema.description
                        );
                        format!("{}\n{}", self.colorize(&title, "cyan"), fields_table(schema))
                    })
                    .collect();
                Ok(sections.join("\n\n"))
            }
        }
    }

    /// Format a publish report.
    pub fn format_report(&self, report: &PublishReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report
                .outcomes
                .iter()
                .filter(|o| o.is_published())
                .map(|o| o.claim_id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["ID", "Subject", "Status", "Detail"]);
                for outcome in &report.outcomes {
                    let (status, detail) = match &outcome.status {
                        PublishStatus::Published { response } => {
                            (self.colorize("published", "green"), compact(response))
                        }
                        PublishStatus::Failed { error } => {
                            (self.colorize("failed", "red"), error.clone())
                        }
                        PublishStatus::Skipped { reason } => {
                            (self.colorize("skipped", "yellow"), reason.clone())
                        }
                    };
                    builder.push_record([
                        short_id(&outcome.claim_id.to_string()),
                        truncate(&outcome.subject, 30),
                        status,
                        truncate(&detail, STATEMENT_WIDTH),
                    ]);
                }
                let summary = format!(
                    "{} published, {} failed, {} skipped",
                    report.succeeded(),
                    report.failed(),
                    report.skipped()
                );
                let summary = if report.is_success() {
                    self.success(&summary)
                } else {
                    self.error(&summary)
                };
                Ok(format!("{}\n{}", render(builder), summary))
            }
        }
    }

    /// Format registry payloads for a dry run (always JSON).
    pub fn format_payloads(&self, payloads: &[Value]) -> Result<String> {
        Ok(serde_json::to_string_pretty(payloads)?)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn claims_table(claims: &[Claim]) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "ID", "Subject", "Claim", "Statement", "Aspect", "Amount", "Date", "Confidence", "Chunks",
    ]);

    for claim in claims {
        let amount = match (claim.amount, &claim.unit) {
            (Some(amount), Some(unit)) => format!("{} {}", amount, unit),
            (Some(amount), None) => amount.to_string(),
            _ => String::new(),
        };
        let chunks = claim
            .supporting_chunks
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",");
        builder.push_record([
            short_id(&claim.id.to_string()),
            claim.subject.clone(),
            claim.claim_type.clone(),
            truncate(&claim.statement, STATEMENT_WIDTH),
            claim.aspect.clone().unwrap_or_default(),
            amount,
            claim
                .effective_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            format!("{:.2}", claim.confidence),
            chunks,
        ]);
    }

    render(builder)
}

fn rejections_table(rejections: &[RejectionRecord]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Chunk", "Field", "Reason"]);
    for record in rejections {
        builder.push_record([
            record.chunk_index.to_string(),
            record.field.clone().unwrap_or_else(|| "-".to_string()),
            truncate(&record.reason.to_string(), STATEMENT_WIDTH),
        ]);
    }
    render(builder)
}

fn fields_table(schema: &Schema) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Type", "Required", "Description"]);
    for field in &schema.fields {
        let field_type = match &field.allowed_values {
            Some(values) => format!("enum [{}]", values.join(", ")),
            None => field.field_type.as_str().to_string(),
        };
        builder.push_record([
            field.name.clone(),
            field_type,
            if field.required { "yes" } else { "" }.to_string(),
            truncate(&field.description, STATEMENT_WIDTH),
        ]);
    }
    render(builder)
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn ids(claims: &[Claim]) -> String {
    claims
        .iter()
        .map(|c| c.id.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// First UUID group is enough to tell claims apart on screen
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn compact(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
