//! Normalizer for the search tool's stdout.
//!
//! Across versions the tool has printed a bare array, an object wrapping the
//! array under `results` or `hits`, or a plain "No results found." line, and
//! it interleaves spinner frames and ANSI colour codes on the same stream.
//! Everything is folded into one [`SearchSnippet`] shape here.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SearchError;

/// Divider between formatted snippets.
pub const SNIPPET_DIVIDER: &str = "\n\n---\n\n";

const PATH_KEYS: &[&str] = &["path", "file"];
const CONTENT_KEYS: &[&str] = &["content", "chunk", "snippet"];
const WRAPPER_KEYS: &[&str] = &["results", "hits"];

static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("ansi pattern is valid")
});

/// One normalized search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSnippet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
}

/// Remove ANSI escape sequences; carriage returns become newlines so
/// spinner frames end up on their own lines.
pub fn strip_ansi(raw: &str) -> String {
    ANSI_RE.replace_all(raw, "").replace('\r', "\n")
}

/// Parse raw tool output into snippets.
///
/// Output without any JSON payload (the "No results found." sentinel,
/// blank output) is an empty list. Output that looks like JSON but never
/// parses is an error.
pub fn normalize_output(raw: &str) -> Result<Vec<SearchSnippet>, SearchError> {
    let cleaned = strip_ansi(raw);
    if cleaned.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut first_error: Option<String> = None;
    let mut saw_structural = false;
    let mut saw_empty_payload = false;

    for (idx, ch) in cleaned.char_indices() {
        if ch != '[' && ch != '{' {
            continue;
        }
        saw_structural = true;

        let mut stream = serde_json::Deserializer::from_str(&cleaned[idx..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => match payload_records(&value) {
                Some(records) if !records.is_empty() => {
                    return Ok(records.iter().filter_map(normalize_record).collect());
                }
                Some(_) => saw_empty_payload = true,
                None => {}
            },
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
            None => {}
        }
    }

    if saw_empty_payload || !saw_structural || is_no_results(&cleaned) {
        return Ok(Vec::new());
    }
    Err(SearchError::Parse(
        first_error.unwrap_or_else(|| "no result array in output".into()),
    ))
}

/// Format snippets for injection: optional path line, then content.
pub fn format_snippets(snippets: &[SearchSnippet]) -> String {
    snippets
        .iter()
        .filter(|s| !s.content.trim().is_empty())
        .map(|s| match &s.path {
            Some(path) => format!("{path}\n{}", s.content.trim()),
            None => s.content.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join(SNIPPET_DIVIDER)
}

/// The record array of a payload, or `None` if `value` is not a payload.
///
/// An array counts only if it is empty or holds at least one object, so
/// stray bracketed status text like `[1]` is skipped. Non-object records
/// inside a payload are dropped later. An empty payload only wins when no
/// later non-empty one follows.
fn payload_records(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) if items.is_empty() || items.iter().any(Value::is_object) => Some(items),
        Value::Object(obj) => WRAPPER_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

fn normalize_record(value: &Value) -> Option<SearchSnippet> {
    let obj = value.as_object()?;
    let content = first_string(obj, CONTENT_KEYS, true)?;
    Some(SearchSnippet {
        path: first_string(obj, PATH_KEYS, true),
        score: obj.get("score").and_then(score_value),
        title: first_string(obj, &["title"], true),
        content,
    })
}

fn first_string(obj: &Map<String, Value>, keys: &[&str], skip_blank: bool) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|s| !skip_blank || !s.trim().is_empty())
        .map(str::to_string)
}

fn score_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn is_no_results(text: &str) -> bool {
    text.to_ascii_lowercase().contains("no results")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_empty_not_error() {
        assert!(normalize_output("No results found.").unwrap().is_empty());
        assert!(normalize_output("No results found.\n").unwrap().is_empty());
        assert!(normalize_output("").unwrap().is_empty());
        assert!(normalize_output("No results found in [memkeep]").unwrap().is_empty());
    }

    #[test]
    fn noisy_array_keeps_fields_verbatim() {
        let raw = "\x1b[?25l\x1b[36m⠋\x1b[0m Searching...\r\x1b[2K\x1b[36m⠙\x1b[0m Searching...\r\x1b[2K\x1b[?25h\
                   [{\"file\":\"qmd://memkeep/MEMORY.md\",\"score\":0.91,\"snippet\":\"Remember dark mode\"},\
                   {\"path\":\"daily/2026-03-01.md\",\"content\":\"  spaced  content \"}]\n";
        let snippets = normalize_output(raw).unwrap();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].path.as_deref(), Some("qmd://memkeep/MEMORY.md"));
        assert_eq!(snippets[0].score, Some(0.91));
        assert_eq!(snippets[0].content, "Remember dark mode");
        assert_eq!(snippets[1].path.as_deref(), Some("daily/2026-03-01.md"));
        assert_eq!(snippets[1].content, "  spaced  content ");
        assert_eq!(snippets[1].score, None);
    }

    #[test]
    fn wrapped_payloads() {
        let results = r#"{"query":"x","results":[{"path":"a.md","chunk":"alpha"}]}"#;
        let hits = r#"{"hits":[{"file":"b.md","content":"beta","score":"0.5"}]}"#;
        assert_eq!(normalize_output(results).unwrap()[0].content, "alpha");
        let hit = &normalize_output(hits).unwrap()[0];
        assert_eq!(hit.path.as_deref(), Some("b.md"));
        assert_eq!(hit.score, Some(0.5));
    }

    #[test]
    fn bracketed_status_lines_are_skipped() {
        let raw = "[info] loading index\n[1] warm\n[]";
        assert!(normalize_output(raw).unwrap().is_empty());

        let raw = "[1/2] embedding\n[{\"content\":\"hit\"}]";
        assert_eq!(normalize_output(raw).unwrap()[0].content, "hit");
    }

    #[test]
    fn blank_content_is_dropped() {
        let raw = r#"[{"path":"a","content":"  "},{"path":"b"},{"path":"c","content":"","snippet":"fallback"}]"#;
        let snippets = normalize_output(raw).unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].path.as_deref(), Some("c"));
        assert_eq!(snippets[0].content, "fallback");
    }

    #[test]
    fn stray_non_object_records_are_skipped() {
        let raw = r#"[{"path":"a.md","content":"alpha"},{"path":"b.md","content":"beta"},null,"str",3]"#;
        let snippets = normalize_output(raw).unwrap();
        let contents: Vec<_> = snippets.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, ["alpha", "beta"]);
    }

    #[test]
    fn empty_array_in_noise_does_not_hide_later_hits() {
        let raw = "Indexed collections: []\n[{\"path\":\"MEMORY.md\",\"content\":\"dark mode\"}]";
        let snippets = normalize_output(raw).unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].content, "dark mode");

        assert!(normalize_output("Indexed collections: []\n").unwrap().is_empty());
        assert!(normalize_output(r#"{"results":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn blank_path_falls_through_to_alias_or_none() {
        let raw = r#"[{"path":"","content":"x"},{"path":"  ","file":"f.md","content":"y"}]"#;
        let snippets = normalize_output(raw).unwrap();
        assert_eq!(snippets[0].path, None);
        assert_eq!(snippets[1].path.as_deref(), Some("f.md"));
        assert_eq!(format_snippets(&snippets[..1]), "x");
    }

    #[test]
    fn broken_json_is_an_error() {
        let err = normalize_output("⠋ working\n[{\"content\": \"unterminated").unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[test]
    fn format_with_and_without_path() {
        let snippets = vec![
            SearchSnippet {
                path: Some("MEMORY.md".into()),
                score: Some(1.0),
                title: None,
                content: "dark mode\n".into(),
            },
            SearchSnippet {
                path: None,
                score: None,
                title: None,
                content: "tabs".into(),
            },
        ];
        assert_eq!(format_snippets(&snippets), "MEMORY.md\ndark mode\n\n---\n\ntabs");
        assert_eq!(format_snippets(&[]), "");
    }
}
