//! Line grammar for exported documents.
//!
//! Deliberately separate from [`crate::document::parse`]: the export path
//! only knows the subset of markup that prints well, and it treats a line
//! wrapped in `**` as the document title rather than as a heading level.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{ColorTag, Rgb};

/// Colored span with a double-quoted style attribute carrying `color:`.
static COLOR_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span\s+style="(?:[^"]*;)?\s*color\s*:\s*([^;"]+)[^"]*"\s*>([^<]*)</span>"#)
        .expect("color span pattern is valid")
});

/// A run of text with its print styling resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRun {
    pub text: String,
    pub bold: bool,
    pub color: Option<Rgb>,
}

impl ExportRun {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: false,
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportElement {
    /// Large centered title. No inline markup is interpreted.
    Title(String),
    Heading(Vec<ExportRun>),
    Paragraph(Vec<ExportRun>),
    Bullet(Vec<ExportRun>),
    Formula(String),
    Rule,
}

/// Classify every non-blank line of `content`.
pub fn parse_export_lines(content: &str) -> Vec<ExportElement> {
    content.lines().filter_map(classify).collect()
}

fn classify(line: &str) -> Option<ExportElement> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "---" {
        return Some(ExportElement::Rule);
    }
    if trimmed.len() >= 4 && trimmed.starts_with("**") && trimmed.ends_with("**") {
        return Some(ExportElement::Title(
            trimmed[2..trimmed.len() - 2].to_string(),
        ));
    }
    if let Some(rest) = trimmed.strip_prefix("## ") {
        return Some(ExportElement::Heading(inline_runs(rest)));
    }
    if let Some(rest) = trimmed.strip_prefix("* ") {
        return Some(ExportElement::Bullet(inline_runs(rest)));
    }
    if let Some(rest) = trimmed.strip_prefix("[FORMULA:") {
        let body = rest.strip_suffix(']').unwrap_or(rest);
        return Some(ExportElement::Formula(body.trim().to_string()));
    }
    Some(ExportElement::Paragraph(inline_runs(line)))
}

/// Split text into runs: color spans first, then `**` pairs.
///
/// Every color span is bold. Only the three semantic colors carry a color;
/// any other code prints in the body color.
pub fn inline_runs(text: &str) -> Vec<ExportRun> {
    let mut runs = Vec::new();
    let mut last = 0;
    for caps in COLOR_SPAN_RE.captures_iter(text) {
        let (Some(whole), Some(code), Some(body)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        bold_pairs(&text[last..whole.start()], &mut runs);
        if !body.as_str().is_empty() {
            runs.push(ExportRun {
                text: body.as_str().to_string(),
                bold: true,
                color: ColorTag::from_css(code.as_str()).rgb(),
            });
        }
        last = whole.end();
    }
    bold_pairs(&text[last..], &mut runs);
    runs
}

fn bold_pairs(text: &str, runs: &mut Vec<ExportRun>) {
    let mut rest = text;
    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else {
            break;
        };
        if open > 0 {
            runs.push(ExportRun::plain(&rest[..open]));
        }
        if close > 0 {
            runs.push(ExportRun {
                text: after[..close].to_string(),
                bold: true,
                color: None,
            });
        }
        rest = &after[close + 2..];
    }
    if !rest.is_empty() {
        runs.push(ExportRun::plain(rest));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(runs: &[ExportRun]) -> Vec<(&str, bool)> {
        runs.iter().map(|r| (r.text.as_str(), r.bold)).collect()
    }

    #[test]
    fn test_title_line_is_not_inline_parsed() {
        let elements = parse_export_lines("**Photosynthesis <b>basics</b>**");
        assert_eq!(
            elements,
            vec![ExportElement::Title("Photosynthesis <b>basics</b>".to_string())]
        );
    }

    #[test]
    fn test_inline_bold_line_is_paragraph() {
        let elements = parse_export_lines("This is **My Title** inline.");
        let [ExportElement::Paragraph(runs)] = elements.as_slice() else {
            panic!("expected one paragraph, got {elements:?}");
        };
        assert_eq!(
            texts(runs),
            vec![("This is ", false), ("My Title", true), (" inline.", false)]
        );
    }

    #[test]
    fn test_only_double_hash_is_a_heading() {
        let elements = parse_export_lines("## Section\n### Deeper\n# Top");
        assert!(matches!(elements[0], ExportElement::Heading(_)));
        assert!(matches!(elements[1], ExportElement::Paragraph(_)));
        assert!(matches!(elements[2], ExportElement::Paragraph(_)));
    }

    #[test]
    fn test_only_star_bullets() {
        let elements = parse_export_lines("* star\n- dash");
        assert!(matches!(elements[0], ExportElement::Bullet(_)));
        assert!(matches!(elements[1], ExportElement::Paragraph(_)));
    }

    #[test]
    fn test_formula_trailing_bracket_is_optional() {
        let elements = parse_export_lines("[FORMULA: E = mc^2]\n[FORMULA: a + b");
        assert_eq!(
            elements,
            vec![
                ExportElement::Formula("E = mc^2".to_string()),
                ExportElement::Formula("a + b".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_lines_dropped_and_rule_kept() {
        let elements = parse_export_lines("a\n\n   \n---\nb");
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[1], ExportElement::Rule);
    }

    #[test]
    fn test_paragraph_keeps_leading_whitespace() {
        let elements = parse_export_lines("   indented");
        assert_eq!(
            elements,
            vec![ExportElement::Paragraph(vec![ExportRun::plain("   indented")])]
        );
    }

    #[test]
    fn test_color_spans_interleave_in_order() {
        let runs = inline_runs(
            "A <span style=\"color: #dc2626; font-weight: bold;\">warning</span> and **bold** \
             <span style=\"color: #059669; font-weight: bold;\">term</span>.",
        );
        assert_eq!(
            texts(&runs),
            vec![
                ("A ", false),
                ("warning", true),
                (" and ", false),
                ("bold", true),
                (" ", false),
                ("term", true),
                (".", false),
            ]
        );
        assert_eq!(runs[1].color, ColorTag::Critical.rgb());
        assert_eq!(runs[5].color, ColorTag::Definition.rgb());
    }

    #[test]
    fn test_rgb_function_color_in_span() {
        let runs = inline_runs(
            "See <span style=\"color: rgb(5, 150, 105); font-weight: bold;\">Term</span> here",
        );
        assert_eq!(
            texts(&runs),
            vec![("See ", false), ("Term", true), (" here", false)]
        );
        assert_eq!(runs[1].color, Some(Rgb::new(5, 150, 105)));

        let runs = inline_runs("<span style=\"color: rgb(220,38,38)\">Alert</span>");
        assert_eq!(runs[0].color, ColorTag::Critical.rgb());
    }

    #[test]
    fn test_unknown_span_color_is_bold_without_color() {
        let runs = inline_runs("<span style=\"color: #2563eb; font-weight: bold;\">blue</span>");
        assert_eq!(
            runs,
            vec![ExportRun {
                text: "blue".to_string(),
                bold: true,
                color: None,
            }]
        );
    }

    #[test]
    fn test_heading_runs_are_inline_parsed() {
        let elements = parse_export_lines("## Key <span style=\"color: #d97706\">example</span>");
        let [ExportElement::Heading(runs)] = elements.as_slice() else {
            panic!("expected heading");
        };
        assert_eq!(runs[1].color, ColorTag::Example.rgb());
    }
}
