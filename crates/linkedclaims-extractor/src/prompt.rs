//! LLM prompt engineering for claim extraction

use linkedclaims_domain::{FieldType, Schema};
use std::fmt::Write;

/// Builds prompts for the LLM to extract claims
///
/// Rendering is a pure function of the schema and the chunk text, so the
/// same inputs always yield byte-identical prompts.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    header: String,
}

impl PromptBuilder {
    /// Create a new prompt builder for a schema
    pub fn new(schema: &Schema) -> Self {
        Self {
            header: render_header(schema),
        }
    }

    /// Build the complete extraction prompt for one chunk
    pub fn build(&self, chunk_text: &str) -> String {
        let mut prompt = String::with_capacity(self.header.len() + chunk_text.len() + 256);

        // 1. Instructions and schema
        prompt.push_str(&self.header);

        // 2. The text to analyze
        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(chunk_text.trim());
        prompt.push_str("\n---\n\n");

        // 3. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }

    /// Build the prompt re-sent after an unparseable reply
    pub fn build_retry(&self, chunk_text: &str) -> String {
        let mut prompt = self.build(chunk_text);
        prompt.push_str("\n\n");
        prompt.push_str(RETRY_REMINDER);
        prompt
    }
}

/// Render the extraction prompt for a schema and chunk
pub fn build_prompt(schema: &Schema, chunk_text: &str) -> String {
    PromptBuilder::new(schema).build(chunk_text)
}

fn render_header(schema: &Schema) -> String {
    let mut header = String::new();

    header.push_str(EXTRACTION_INSTRUCTIONS);
    header.push_str("\n\n");

    let _ = writeln!(header, "Claim type: {}", schema.name);
    let _ = writeln!(header, "{}\n", schema.description.trim());

    header.push_str("Fields:\n");
    for field in &schema.fields {
        let requirement = if field.required { "required" } else { "optional" };
        let _ = write!(
            header,
            "- \"{}\" ({}, {})",
            field.name,
            field.field_type.as_str(),
            requirement
        );
        if field.field_type == FieldType::Enum {
            if let Some(values) = &field.allowed_values {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
                let _ = write!(header, " one of [{}]", quoted.join(", "));
            }
        }
        let _ = writeln!(header, ": {}", field.description);
    }
    header.push('\n');

    let required: Vec<&str> = schema.required_fields().map(|f| f.name.as_str()).collect();
    let _ = writeln!(
        header,
        "Every object MUST include these fields: {}.",
        required.join(", ")
    );
    header.push_str(CONFIDENCE_GUIDANCE);
    header.push_str("\n\n");

    header
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are a claim extraction specialist. Identify factual claims in the text below that can be proven true or false with evidence, and return them as structured JSON.

Rules:
- Only extract claims supported by explicit evidence in the text
- Never invent claims or use outside knowledge
- One fact per claim; prefer precision over quantity
- Keep numbers exactly as stated; put them in the numeric field, not only in the statement
- The text may be a fragment of a PDF with formatting artifacts; read through them
- If the text contains no matching claims, return an empty array []"#;

const CONFIDENCE_GUIDANCE: &str = r#"The "confidence" field is your certainty that the text actually states the claim (extraction certainty), NOT whether the claim is true. Use lower values when the wording is hedged or the figure is ambiguous."#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format: a single JSON array of objects, even when there is only one claim or none.
Return ONLY the JSON array: no markdown code blocks, no explanations, no text before or after it."#;

const RETRY_REMINDER: &str = r#"Your previous reply could not be parsed. Reply with the JSON array only, starting with [ and ending with ]."#;
