//! Defensive parsing of model output.
//!
//! Model responses are supposed to be bare JSON but routinely arrive
//! wrapped in markdown fences, prefixed with prose, or structurally
//! wrong (a single object instead of an array). The cascade here
//! normalizes all of that into one tagged result; callers never branch
//! on raw shapes themselves.

use serde::Deserialize;
use serde_json::Value;

use crate::themes::ThemeCatalog;

/// Normalized outcome of parsing a response that should be a JSON array
/// of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRecords {
    /// One or more records were recovered.
    Parsed(Vec<Value>),
    /// Nothing parseable was found.
    Empty,
}

/// One classification record as the model emits it, before guardrails.
/// All fields default so a partially-filled object still deserializes.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAssignment {
    /// Review the model claims to classify.
    #[serde(default)]
    pub review_id: String,
    /// Theme name as emitted; may be invalid.
    #[serde(default)]
    pub chosen_theme: String,
    /// One-line justification.
    #[serde(default)]
    pub short_reason: String,
}

/// Parse a response expected to be a JSON array of records.
///
/// Cascade: direct parse, then markdown-fence extraction, then
/// outermost-bracket extraction. A single JSON object is promoted to a
/// one-element array.
#[must_use]
pub fn parse_records(raw: &str) -> ParsedRecords {
    for candidate in candidates(raw, '[', ']') {
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            match value {
                Value::Array(items) => return ParsedRecords::Parsed(items),
                Value::Object(_) => return ParsedRecords::Parsed(vec![value]),
                _ => {}
            }
        }
    }
    ParsedRecords::Empty
}

/// Parse a response expected to be a single JSON object.
#[must_use]
pub fn parse_object(raw: &str) -> Option<Value> {
    for candidate in candidates(raw, '{', '}') {
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            if value.is_object() {
                return Some(value);
            }
        }
    }
    None
}

/// Candidate strings to attempt parsing, in order: the trimmed raw
/// text, the contents of the first markdown code fence, and the
/// outermost `open`..`close` span (falling back to `{`..`}` when the
/// expected delimiters are absent).
fn candidates(raw: &str, open: char, close: char) -> Vec<String> {
    let trimmed = raw.trim();
    let mut out = vec![trimmed.to_string()];

    if let Some(fenced) = fenced_block(trimmed) {
        out.push(fenced);
    }

    if let Some(span) = outermost_span(trimmed, open, close) {
        out.push(span.to_string());
    } else if let Some(span) = outermost_span(trimmed, '{', '}') {
        out.push(span.to_string());
    }

    out
}

/// Extract the contents of the first ``` code fence, tolerating an
/// optional `json` language tag.
fn fenced_block(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body = after_fence.strip_prefix("json").unwrap_or(after_fence);
    let end = body.find("```")?;
    Some(body[..end].trim().to_string())
}

/// Slice from the first `open` to the last `close`, inclusive.
fn outermost_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Line-based fallback for classification responses that are not JSON
/// at all. Scans for labelled `review_id` / `chosen_theme` /
/// `short_reason` lines and emits a record each time all three have
/// been seen.
#[must_use]
pub fn parse_assignment_lines(raw: &str, catalog: &ThemeCatalog) -> Vec<RawAssignment> {
    let mut assignments = Vec::new();
    let mut review_id: Option<String> = None;
    let mut theme: Option<String> = None;
    let mut reason: Option<String> = None;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_ascii_lowercase();

        if lower.contains("review_id") || lower.contains("id:") {
            if let Some(value) = labelled_value(line, &lower, &["review_id", "id"]) {
                review_id = Some(value);
            }
        }

        if lower.contains("chosen_theme") || lower.contains("theme:") {
            for name in catalog.names() {
                if lower.contains(&name.to_ascii_lowercase()) {
                    theme = Some(name.to_string());
                    break;
                }
            }
        }

        if lower.contains("short_reason") || lower.contains("reason:") {
            if let Some(value) = labelled_value(line, &lower, &["short_reason", "reason"]) {
                reason = Some(value);
            }
        }

        if let (Some(id), Some(t), Some(r)) = (&review_id, &theme, &reason) {
            assignments.push(RawAssignment {
                review_id: id.clone(),
                chosen_theme: t.clone(),
                short_reason: r.clone(),
            });
            review_id = None;
            theme = None;
            reason = None;
        }
    }

    assignments
}

/// Value after the first matching label on a line, trimmed of label
/// punctuation and surrounding quotes.
fn labelled_value(line: &str, lower: &str, labels: &[&str]) -> Option<String> {
    for label in labels {
        if let Some(pos) = lower.find(label) {
            let rest = &line[pos + label.len()..];
            let value = rest
                .trim_start_matches([':', ' ', '\t', '"'])
                .trim_end_matches([',', ' ', '"'])
                .trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_json_array() {
        let raw = r#"[{"review_id": "r1", "chosen_theme": "Trading Experience", "short_reason": "speed"}]"#;
        let ParsedRecords::Parsed(records) = parse_records(raw) else {
            panic!("expected parsed records");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["review_id"], json!("r1"));
    }

    #[test]
    fn strips_markdown_fences() {
        let raw = "Here you go:\n```json\n[{\"review_id\": \"r1\"}]\n```\nHope that helps!";
        let ParsedRecords::Parsed(records) = parse_records(raw) else {
            panic!("expected parsed records");
        };
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn extracts_array_embedded_in_prose() {
        let raw = "Sure! The classifications are [{\"review_id\": \"r1\"}] as requested.";
        let ParsedRecords::Parsed(records) = parse_records(raw) else {
            panic!("expected parsed records");
        };
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn promotes_single_object_to_array() {
        let raw = r#"{"review_id": "r1", "chosen_theme": "Trading Experience"}"#;
        let ParsedRecords::Parsed(records) = parse_records(raw) else {
            panic!("expected parsed records");
        };
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn garbage_is_empty() {
        assert_eq!(parse_records("I cannot help with that."), ParsedRecords::Empty);
        assert_eq!(parse_records(""), ParsedRecords::Empty);
        assert!(parse_object("not json at all").is_none());
    }

    #[test]
    fn parse_object_handles_fences_and_prose() {
        let raw = "```json\n{\"theme\": \"Trading Experience\", \"key_points\": []}\n```";
        let value = parse_object(raw).unwrap();
        assert_eq!(value["theme"], json!("Trading Experience"));

        let raw = "The summary: {\"theme\": \"X\"} done.";
        assert!(parse_object(raw).is_some());
    }

    #[test]
    fn line_heuristic_recovers_labelled_output() {
        let catalog = ThemeCatalog::default();
        let raw = "\
            review_id: r1\n\
            chosen_theme: Trading Experience\n\
            short_reason: mentions order speed\n\
            \n\
            review_id: r2\n\
            chosen_theme: Support & Service Quality\n\
            short_reason: praises the helpdesk\n";

        let assignments = parse_assignment_lines(raw, &catalog);
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].review_id, "r1");
        assert_eq!(assignments[0].chosen_theme, "Trading Experience");
        assert_eq!(assignments[1].chosen_theme, "Support & Service Quality");
        assert_eq!(assignments[1].short_reason, "praises the helpdesk");
    }

    #[test]
    fn line_heuristic_matches_themes_case_insensitively() {
        let catalog = ThemeCatalog::default();
        let raw = "id: r9\ntheme: payments, upi & settlements\nreason: UPI deposit failed\n";
        let assignments = parse_assignment_lines(raw, &catalog);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].chosen_theme, "Payments, UPI & Settlements");
    }

    #[test]
    fn line_heuristic_ignores_incomplete_records() {
        let catalog = ThemeCatalog::default();
        let raw = "review_id: r1\nchosen_theme: Trading Experience\n";
        assert!(parse_assignment_lines(raw, &catalog).is_empty());
    }
}
