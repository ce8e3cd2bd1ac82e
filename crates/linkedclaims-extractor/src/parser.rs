//! Parse LLM output into claim candidates
//!
//! Models rarely return exactly what they are asked for. Strategies are tried
//! in order of preference:
//!
//! 1. the whole reply is a JSON array (or object)
//! 2. an array embedded in prose, found by bracket-depth scanning
//! 3. a single object, treated as a one-element array
//! 4. a truncated array, keeping every element that closed before the cut
//!
//! Markdown code fences are stripped before any of these run.

use linkedclaims_domain::candidate::excerpt;
use linkedclaims_domain::{ClaimCandidate, RejectionReason, RejectionRecord};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// No JSON structure could be recovered from a reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no JSON array or object found in response: {excerpt}")]
pub struct UnparseableResponseError {
    /// Leading slice of the reply
    pub excerpt: String,
}

impl From<UnparseableResponseError> for RejectionReason {
    fn from(err: UnparseableResponseError) -> Self {
        RejectionReason::UnparseableResponse {
            detail: err.to_string(),
        }
    }
}

/// Which strategy recovered the JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Reply was a JSON array
    Direct,
    /// Array found inside surrounding prose
    Embedded,
    /// Single object wrapped as a one-element array
    SingleObject,
    /// Complete elements recovered from an unterminated array
    Truncated,
}

/// Candidates recovered from one reply
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    /// Object elements, in reply order
    pub candidates: Vec<ClaimCandidate>,

    /// Elements that were not objects
    pub rejections: Vec<RejectionRecord>,

    /// Strategy that succeeded
    pub strategy: ParseStrategy,
}

/// Parse a raw reply into candidates for `chunk_index`
pub fn parse_response(
    raw: &str,
    chunk_index: usize,
) -> Result<ParsedResponse, UnparseableResponseError> {
    let (elements, strategy) = recover_elements(raw).ok_or_else(|| UnparseableResponseError {
        excerpt: excerpt(raw),
    })?;

    debug!(chunk = chunk_index, ?strategy, elements = elements.len(), "Parsed model response");

    let mut candidates = Vec::new();
    let mut rejections = Vec::new();
    for element in elements {
        match element {
            Value::Object(fields) => candidates.push(ClaimCandidate::new(fields, chunk_index, raw)),
            other => rejections.push(RejectionRecord::for_chunk(
                chunk_index,
                RejectionReason::NotAnObject {
                    excerpt: excerpt(&other.to_string()),
                },
            )),
        }
    }

    Ok(ParsedResponse {
        candidates,
        rejections,
        strategy,
    })
}

/// Recover the top-level elements of a reply
fn recover_elements(raw: &str) -> Option<(Vec<Value>, ParseStrategy)> {
    let text = strip_code_fence(raw);

    // 1. Whole reply
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => return Some((items, ParseStrategy::Direct)),
        Ok(Value::Object(obj)) => {
            return Some((vec![Value::Object(obj)], ParseStrategy::SingleObject))
        }
        _ => {}
    }

    // 3. A bare object ahead of any array is the whole answer
    let object_at = text.find('{');
    let leading_object = match (object_at, text.find('[')) {
        (Some(o), Some(a)) => o < a,
        (Some(_), None) => true,
        _ => false,
    };
    if leading_object {
        if let Some(found) = embedded_object(text) {
            return Some(found);
        }
    }

    // 2 and 4. Try each `[` in turn; prose before the claims may hold
    // bracketed text of its own
    let mut fallback = None;
    for (start, _) in text.match_indices('[') {
        match matching_close(text, start) {
            Some(end) => {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&text[start..=end]) {
                    if items.iter().any(Value::is_object) {
                        return Some((items, ParseStrategy::Embedded));
                    }
                    fallback.get_or_insert((items, ParseStrategy::Embedded));
                }
            }
            // Every later `[` sits inside this unterminated one
            None => {
                if let Some(items) = recover_truncated(&text[start..]) {
                    if !items.is_empty() {
                        warn!(recovered = items.len(), "Recovered elements from truncated response");
                        return Some((items, ParseStrategy::Truncated));
                    }
                    fallback.get_or_insert((items, ParseStrategy::Truncated));
                }
                break;
            }
        }
    }

    if !leading_object {
        if let Some(found) = embedded_object(text) {
            return Some(found);
        }
    }
    fallback
}

/// First `{...}` span of `text`, if it is a valid object
fn embedded_object(text: &str) -> Option<(Vec<Value>, ParseStrategy)> {
    let start = text.find('{')?;
    let end = matching_close(text, start)?;
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(obj)) => Some((vec![Value::Object(obj)], ParseStrategy::SingleObject)),
        _ => None,
    }
}

/// Content of the first markdown code fence, or the trimmed input
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    // Skip the info string (```json)
    let after_open = &trimmed[open + 3..];
    let body_start = after_open.find('\n').map_or(after_open.len(), |i| i + 1);
    let body = &after_open[body_start..];

    match body.find("```") {
        Some(close) => body[..close].trim(),
        // Fence never closed: the reply was cut off inside it
        None => body.trim(),
    }
}

/// Byte index of the bracket closing the one at `open`
///
/// String literals (and escapes inside them) are skipped.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[open..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Complete elements of an array that was cut off
///
/// `text` starts at the opening `[`. Returns `None` if the array is actually
/// closed, since a closed array that failed to parse is not a truncation.
fn recover_truncated(text: &str) -> Option<Vec<Value>> {
    let body = text.strip_prefix('[')?;
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut segment_start = 0usize;

    let push_segment = |segment: &str, items: &mut Vec<Value>| {
        let segment = segment.trim();
        if segment.is_empty() {
            return;
        }
        match serde_json::from_str::<Value>(segment) {
            Ok(value) => items.push(value),
            Err(e) => debug!(error = %e, "Skipping malformed element"),
        }
    };

    for (i, c) in body.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' if depth == 0 => return None,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    push_segment(&body[segment_start..=i], &mut items);
                    segment_start = i + c.len_utf8();
                }
            }
            ',' if depth == 0 => {
                push_segment(&body[segment_start..i], &mut items);
                segment_start = i + 1;
            }
            _ => {}
        }
    }

    // Whatever follows the last complete element was cut off
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedResponse {
        parse_response(raw, 0).unwrap()
    }

    #[test]
    fn test_parse_valid_array() {
        let parsed = parse(
            r#"[
                {"subject": "Acme", "claim": "impact", "statement": "Acme planted 500 trees", "confidence": 0.9},
                {"subject": "Acme", "claim": "impact", "statement": "Acme trained 20 people", "confidence": 0.8}
            ]"#,
        );
        assert_eq!(parsed.strategy, ParseStrategy::Direct);
        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.candidates[1].text("statement").as_deref(), Some("Acme trained 20 people"));
    }

    #[test]
    fn test_parse_empty_array() {
        let parsed = parse("[]");
        assert!(parsed.candidates.is_empty());
        assert!(parsed.rejections.is_empty());
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let parsed = parse(
            "```json\n[{\"subject\": \"Bob\", \"claim\": \"impact\", \"statement\": \"x\"}]\n```",
        );
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].text("subject").as_deref(), Some("Bob"));
    }

    #[test]
    fn test_parse_markdown_without_language() {
        let parsed = parse("Here you go:\n```\n[{\"subject\": \"Bob\"}]\n```\nHope this helps");
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn test_prose_wrapped_array() {
        let raw = r#"Sure! Here are the claims I found:
[{"subject": "Acme", "claim": "impact", "statement": "Acme [the company] planted trees"}]
Let me know if you need anything else."#;
        let parsed = parse(raw);
        assert_eq!(parsed.strategy, ParseStrategy::Embedded);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(
            parsed.candidates[0].text("statement").as_deref(),
            Some("Acme [the company] planted trees")
        );
    }

    #[test]
    fn test_single_object() {
        let parsed = parse(r#"{"subject": "Acme", "claim": "impact", "statement": "x", "tags": ["a"]}"#);
        assert_eq!(parsed.strategy, ParseStrategy::SingleObject);
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn test_single_object_in_prose() {
        let parsed = parse(r#"The claim is {"subject": "Acme", "aspects": ["impact:social"]} as requested."#);
        assert_eq!(parsed.strategy, ParseStrategy::SingleObject);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].text("subject").as_deref(), Some("Acme"));
    }

    #[test]
    fn test_truncated_single_element() {
        let parsed = parse(r#"[{"subject":"A","claim":"impact","statement":"x","confidence":0.9}"#);
        assert_eq!(parsed.strategy, ParseStrategy::Truncated);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].text("subject").as_deref(), Some("A"));
    }

    #[test]
    fn test_truncated_mid_element() {
        let parsed = parse(
            r#"[{"subject":"A","statement":"one"}, {"subject":"B","statement":"two"}, {"subject":"C","stat"#,
        );
        assert_eq!(parsed.strategy, ParseStrategy::Truncated);
        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.candidates[1].text("subject").as_deref(), Some("B"));
    }

    #[test]
    fn test_truncated_inside_string_with_brackets() {
        let parsed = parse(r#"[{"subject":"A","statement":"uses } and ] chars"}, {"subject":"B","statement":"cut ]"#);
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn test_truncated_before_any_element() {
        let parsed = parse(r#"[{"subject":"#);
        assert_eq!(parsed.strategy, ParseStrategy::Truncated);
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn test_truncated_fence() {
        let parsed = parse("```json\n[{\"subject\":\"A\"},\n{\"subject\":\"B\"");
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn test_non_object_elements_rejected() {
        let parsed = parse(r#"[{"subject":"A"}, "stray text", 42]"#);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.rejections.len(), 2);
        assert!(matches!(
            parsed.rejections[0].reason,
            RejectionReason::NotAnObject { .. }
        ));
    }

    #[test]
    fn test_unparseable() {
        let err = parse_response("I could not find any claims in this text.", 4).unwrap_err();
        assert!(err.excerpt.starts_with("I could not"));

        let reason: RejectionReason = err.into();
        assert!(matches!(reason, RejectionReason::UnparseableResponse { .. }));
    }

    #[test]
    fn test_closed_but_invalid_array_is_unparseable() {
        assert!(parse_response("See [citation needed] for details", 0).is_err());
    }

    #[test]
    fn test_unparseable_bracket_before_array() {
        let parsed = parse(
            r#"I found claims [2 total]: [{"subject":"A","statement":"one"}, {"subject":"B","statement":"two"}]"#,
        );
        assert_eq!(parsed.strategy, ParseStrategy::Embedded);
        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.candidates[1].text("subject").as_deref(), Some("B"));
    }

    #[test]
    fn test_citation_before_array() {
        let parsed = parse(
            r#"Per the report [1], the claims are: [{"subject":"A","statement":"one"}, {"subject":"B","statement":"two"}]"#,
        );
        assert_eq!(parsed.strategy, ParseStrategy::Embedded);
        assert_eq!(parsed.candidates.len(), 2);
        assert!(parsed.rejections.is_empty());
    }

    #[test]
    fn test_truncated_array_after_bracketed_prose() {
        let parsed = parse(
            r#"Claims [partial]: [{"subject":"A","statement":"one"}, {"subject":"B","stat"#,
        );
        assert_eq!(parsed.strategy, ParseStrategy::Truncated);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].text("subject").as_deref(), Some("A"));
    }

    #[test]
    fn test_truncated_before_nested_array_closes() {
        let parsed = parse(r#"[{"subject":"A","items":[{"x":1}],"stat"#);
        assert_eq!(parsed.strategy, ParseStrategy::Truncated);
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn test_empty_array_in_prose() {
        let parsed = parse("No claims were found: []");
        assert_eq!(parsed.strategy, ParseStrategy::Embedded);
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn test_candidate_provenance() {
        let parsed = parse_response(r#"[{"subject":"A"}]"#, 7).unwrap();
        assert_eq!(parsed.candidates[0].source_chunk_index, 7);
        assert_eq!(parsed.candidates[0].raw_response_excerpt, r#"[{"subject":"A"}]"#);
    }

    #[test]
    fn test_matching_close_skips_strings() {
        let text = r#"[{"a": "]"}, {"b": "\"]"}] tail"#;
        let end = matching_close(text, 0).unwrap();
        assert_eq!(&text[end + 1..], " tail");
    }
}
