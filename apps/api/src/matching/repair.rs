//! Recovers a JSON array of objects from noisy completion output.
//!
//! Order of attempts:
//! 1. the first bracketed array that opens with an object, found by a
//!    bracket-matching scan (string- and escape-aware, spans newlines);
//!    a truncated array yields every complete object before the cut;
//! 2. the whole text, after stripping Markdown code fences;
//! 3. a single sentinel record carrying the raw text.
//!
//! `parse_json_array` never fails and never returns an empty sequence for
//! unparseable input.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// Title carried by the fallback record.
pub const SENTINEL_TITLE: &str = "AI Extraction Error";

const SENTINEL_MARKER: &str = "sentinel";

pub type Record = Map<String, Value>;

pub fn parse_json_array(text: &str) -> Vec<Record> {
    if let Some(records) = parse_embedded_array(text) {
        return records;
    }
    if let Some(records) = parse_whole_text(text) {
        return records;
    }
    warn!(
        "Completion output was not parseable as a JSON array ({} chars); using sentinel",
        text.len()
    );
    vec![sentinel_record(text)]
}

/// The fallback record: `{"title": SENTINEL_TITLE, "rationale": <raw text>}`.
pub fn sentinel_record(raw: &str) -> Record {
    let mut record = Map::new();
    record.insert("title".into(), Value::String(SENTINEL_TITLE.into()));
    record.insert("rationale".into(), Value::String(raw.to_string()));
    record.insert(SENTINEL_MARKER.into(), Value::Bool(true));
    record
}

pub fn is_sentinel(record: &Record) -> bool {
    record.get(SENTINEL_MARKER) == Some(&Value::Bool(true))
}

/// Raw text carried by a sentinel record.
pub fn sentinel_text(record: &Record) -> &str {
    record
        .get("rationale")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Deserializes each record into `T`, skipping (and logging) the ones that don't fit.
pub fn decode_records<T: DeserializeOwned>(records: Vec<Record>, kind: &str) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value(Value::Object(record)) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping unreadable {kind} record: {e}");
                None
            }
        })
        .collect()
}

enum Scan {
    /// Byte index of the closing `]`.
    Closed(usize),
    /// Array never closed; byte ranges of the complete top-level objects seen.
    Truncated(Vec<(usize, usize)>),
}

fn parse_embedded_array(text: &str) -> Option<Vec<Record>> {
    let bytes = text.as_bytes();
    for (start, _) in text.match_indices('[') {
        if !opens_with_object(&bytes[start + 1..]) {
            continue;
        }
        match scan_array(bytes, start) {
            Scan::Closed(end) => {
                if let Ok(Value::Array(items)) = serde_json::from_str(&text[start..=end]) {
                    let records = objects_only(items);
                    if !records.is_empty() {
                        return Some(records);
                    }
                }
            }
            Scan::Truncated(spans) => {
                let salvaged: Vec<Record> = spans
                    .into_iter()
                    .filter_map(|(s, e)| serde_json::from_str::<Record>(&text[s..=e]).ok())
                    .collect();
                if !salvaged.is_empty() {
                    warn!("Salvaged {} objects from a truncated JSON array", salvaged.len());
                    return Some(salvaged);
                }
            }
        }
    }
    None
}

fn opens_with_object(rest: &[u8]) -> bool {
    rest.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

fn scan_array(bytes: &[u8], start: usize) -> Scan {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut object_start = None;
    let mut objects = Vec::new();

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                if b == b'{' && depth == 1 {
                    object_start = Some(i);
                }
                depth += 1;
            }
            b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Scan::Closed(i);
                }
                if b == b'}' && depth == 1 {
                    if let Some(s) = object_start.take() {
                        objects.push((s, i));
                    }
                }
            }
            _ => {}
        }
    }
    Scan::Truncated(objects)
}

fn parse_whole_text(text: &str) -> Option<Vec<Record>> {
    match serde_json::from_str::<Value>(strip_json_fences(text)).ok()? {
        Value::Array(items) if items.is_empty() => Some(Vec::new()),
        Value::Array(items) => {
            let records = objects_only(items);
            (!records.is_empty()).then_some(records)
        }
        Value::Object(record) => Some(vec![record]),
        _ => None,
    }
}

fn objects_only(items: Vec<Value>) -> Vec<Record> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from completion output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_values(records: Vec<Record>) -> Vec<Value> {
        records.into_iter().map(Value::Object).collect()
    }

    #[test]
    fn test_well_formed_array_decodes_exactly() {
        let text = r#"[{"title": "Rust", "rationale": "core language"}, {"title": "SQL", "rationale": ""}]"#;
        let parsed = as_values(parse_json_array(text));
        assert_eq!(
            parsed,
            vec![
                json!({"title": "Rust", "rationale": "core language"}),
                json!({"title": "SQL", "rationale": ""}),
            ]
        );
    }

    #[test]
    fn test_array_wrapped_in_prose_is_recovered() {
        let text = "Sure! Here are the requirements:\n[\n  {\"title\": \"Rust\"},\n  {\"title\": \"Go\"}\n]\nLet me know if you need more.";
        let parsed = parse_json_array(text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["title"], "Go");
    }

    #[test]
    fn test_brackets_inside_strings_do_not_confuse_scan() {
        let text = r#"Result: [{"title": "Arrays [and] braces {}", "rationale": "quote \" ]"}] done"#;
        let parsed = parse_json_array(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["title"], "Arrays [and] braces {}");
    }

    #[test]
    fn test_bracketed_prose_before_array_is_skipped() {
        let text = r#"Note [see below] then [{"title": "Degree"}]"#;
        let parsed = parse_json_array(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["title"], "Degree");
    }

    #[test]
    fn test_truncated_array_salvages_complete_objects() {
        let text = r#"[{"title": "Rust", "met": true}, {"title": "Go", "met": false}, {"title": "Kub"#;
        let parsed = parse_json_array(text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["title"], "Rust");
        assert_eq!(parsed[1]["met"], false);
    }

    #[test]
    fn test_fenced_single_object_is_wrapped() {
        let text = "```json\n{\"question\": \"Q?\", \"answer\": \"A.\"}\n```";
        let parsed = parse_json_array(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["answer"], "A.");
    }

    #[test]
    fn test_empty_array_is_decoded_as_empty() {
        assert!(parse_json_array("[]").is_empty());
    }

    #[test]
    fn test_garbage_yields_single_sentinel() {
        let text = "I'm sorry, I cannot help with that.";
        let parsed = parse_json_array(text);
        assert_eq!(parsed.len(), 1);
        assert!(is_sentinel(&parsed[0]));
        assert_eq!(parsed[0]["title"], SENTINEL_TITLE);
        assert_eq!(sentinel_text(&parsed[0]), text);
    }

    #[test]
    fn test_empty_text_yields_sentinel() {
        let parsed = parse_json_array("");
        assert_eq!(parsed.len(), 1);
        assert!(is_sentinel(&parsed[0]));
    }

    #[test]
    fn test_array_of_scalars_yields_sentinel() {
        let parsed = parse_json_array(r#"["Rust", "Go"]"#);
        assert_eq!(parsed.len(), 1);
        assert!(is_sentinel(&parsed[0]));
    }

    #[test]
    fn test_regular_records_are_not_sentinels() {
        let parsed = parse_json_array(r#"[{"title": "AI Extraction Error"}]"#);
        assert!(!is_sentinel(&parsed[0]));
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }
}
