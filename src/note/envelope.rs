//! Parsing of text returned by the note generator.
//!
//! The generator is asked for JSON but often wraps it in a code fence or
//! answers in prose. These functions accept whatever came back and never
//! fail.

use serde::Deserialize;

const FALLBACK_SUBJECT: &str = "Study Notes";
const FALLBACK_HEADER: &str = "**Generated Study Notes**";
const DEFAULT_CATEGORY: &str = "uncategorized";
const DEFAULT_DESCRIPTION: &str = "No AI description available";
/// Unparsable replies at most this long are treated as noise.
const MIN_FALLBACK_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedNote {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub note_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAnalysis {
    pub category: String,
    pub description: String,
}

#[derive(Deserialize)]
struct RawAnalysis {
    category: Option<String>,
    description: Option<String>,
}

/// Remove a surrounding "```json" or "```" fence.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(inner) => inner.strip_suffix("```").unwrap_or(inner).trim(),
        None => text,
    }
}

/// Parse a generator reply into notes.
///
/// A JSON array yields its notes; any other valid JSON yields none. Text
/// that is not JSON at all becomes a single fallback note when it is long
/// enough to be worth keeping.
pub fn parse_generated_notes(text: &str) -> Vec<GeneratedNote> {
    let cleaned = strip_code_fence(text);
    match serde_json::from_str::<serde_json::Value>(cleaned) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<GeneratedNote>(item) {
                Ok(note) => Some(note),
                Err(err) => {
                    tracing::warn!("skipping malformed generated note: {err}");
                    None
                }
            })
            .collect(),
        Ok(_) => {
            tracing::warn!("generator reply is JSON but not an array");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!("generator reply is not JSON: {err}");
            if cleaned.chars().count() > MIN_FALLBACK_LEN {
                vec![GeneratedNote {
                    subject: Some(FALLBACK_SUBJECT.to_string()),
                    note_content: format!("{FALLBACK_HEADER}\n\n{cleaned}"),
                }]
            } else {
                Vec::new()
            }
        }
    }
}

/// Lowercase, with anything outside `[a-z0-9_-]` replaced by `-`.
fn folder_safe(category: &str) -> String {
    category
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Parse an image-analysis reply into a category and description.
pub fn parse_image_analysis(text: &str) -> ImageAnalysis {
    let raw = serde_json::from_str::<RawAnalysis>(strip_code_fence(text)).ok();
    let (category, description) = raw.map_or((None, None), |r| (r.category, r.description));
    ImageAnalysis {
        category: category
            .filter(|c| !c.trim().is_empty())
            .map_or_else(|| DEFAULT_CATEGORY.to_string(), |c| folder_safe(&c)),
        description: description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_array() {
        let reply = "```json\n[{\"subject\": \"Biology\", \"noteContent\": \"## Cells\"}]\n```";
        let notes = parse_generated_notes(reply);
        assert_eq!(
            notes,
            vec![GeneratedNote {
                subject: Some("Biology".to_string()),
                note_content: "## Cells".to_string(),
            }]
        );
    }

    #[test]
    fn test_bare_fence_is_stripped() {
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[test]
    fn test_non_array_json_yields_nothing() {
        assert!(parse_generated_notes("{\"subject\": \"x\"}").is_empty());
        assert!(parse_generated_notes("[]").is_empty());
    }

    #[test]
    fn test_prose_becomes_fallback_note() {
        let notes = parse_generated_notes("Here are your notes about plants.");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].subject.as_deref(), Some("Study Notes"));
        assert_eq!(
            notes[0].note_content,
            "**Generated Study Notes**\n\nHere are your notes about plants."
        );
    }

    #[test]
    fn test_short_garbage_yields_nothing() {
        assert!(parse_generated_notes("oops").is_empty());
        assert!(parse_generated_notes("").is_empty());
    }

    #[test]
    fn test_image_analysis_lowercases_category() {
        let analysis =
            parse_image_analysis("```json\n{\"category\": \"Nature\", \"description\": \"A tree\"}\n```");
        assert_eq!(analysis.category, "nature");
        assert_eq!(analysis.description, "A tree");
    }

    #[test]
    fn test_image_analysis_defaults() {
        let analysis = parse_image_analysis("not json");
        assert_eq!(analysis.category, "uncategorized");
        assert_eq!(analysis.description, "No AI description available");
    }

    #[test]
    fn test_image_analysis_category_is_folder_safe() {
        let analysis =
            parse_image_analysis(r#"{"category": "Cell Biology & Genetics!", "description": "x"}"#);
        assert_eq!(analysis.category, "cell-biology---genetics-");

        let analysis = parse_image_analysis(r#"{"category": "math_101-B"}"#);
        assert_eq!(analysis.category, "math_101-b");
    }

    #[test]
    fn test_image_analysis_blank_category_is_uncategorized() {
        let analysis = parse_image_analysis(r#"{"category": "   "}"#);
        assert_eq!(analysis.category, "uncategorized");
    }
}
