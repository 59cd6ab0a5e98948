//! Note content parsing.
//!
//! Turns raw note text into an ordered list of [`Block`]s. The input comes
//! from an unreliable generator, so nothing here can fail: anything that
//! does not match a known construct degrades to a paragraph.

use once_cell::sync::Lazy;
use regex::Regex;

use super::inline::split_runs;
use super::types::Block;

/// The three accepted diagram notations. Each form only closes itself.
static DIAGRAM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<mermaid>(.*?)</mermaid>|<MERMAID>(.*?)</MERMAID>|```mermaid[ \t]*\r?\n(.*?)```",
    )
    .expect("diagram pattern is valid")
});

const FORMULA_PREFIX: &str = "[FORMULA:";
const BULLET_PREFIXES: [&str; 3] = ["* ", "- ", "• "];

/// A slice of the source that is either a diagram or ordinary text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Diagram(&'a str),
}

/// Parse note text into blocks.
///
/// # Example
///
/// ```
/// use snapnote::document::{parse, Block};
///
/// let blocks = parse("**Cells**\n\n[FORMULA: E = mc^2]");
/// assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
/// assert!(matches!(blocks[1], Block::Formula { .. }));
/// ```
pub fn parse(source: &str) -> Vec<Block> {
    let _scope = crate::perf::scope("document.parse");
    let mut blocks = Vec::new();
    for segment in split_segments(source) {
        match segment {
            Segment::Diagram(body) => blocks.push(Block::Diagram {
                source: body.trim().to_string(),
            }),
            Segment::Text(text) => {
                blocks.extend(
                    text.lines()
                        .filter(|line| !line.trim().is_empty())
                        .map(classify_line),
                );
            }
        }
    }
    blocks
}

fn split_segments(source: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in DIAGRAM_RE.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        let body = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        if whole.start() > last {
            segments.push(Segment::Text(&source[last..whole.start()]));
        }
        segments.push(Segment::Diagram(body));
        last = whole.end();
    }
    if last < source.len() {
        segments.push(Segment::Text(&source[last..]));
    }
    segments
}

fn classify_line(line: &str) -> Block {
    let trimmed = line.trim();

    if trimmed == "---" {
        return Block::Rule;
    }

    if let Some(title) = whole_line_bold(trimmed) {
        return heading(1, title);
    }

    for (prefix, level) in [("### ", 3), ("## ", 2), ("# ", 1)] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return heading(level, rest.trim());
        }
    }

    for prefix in BULLET_PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return Block::Bullet {
                runs: split_runs(rest.trim_start()),
            };
        }
    }

    if let Some(text) = formula_payload(trimmed) {
        return Block::Formula {
            text: text.to_string(),
        };
    }

    Block::Paragraph {
        runs: split_runs(line),
    }
}

fn heading(level: u8, text: &str) -> Block {
    Block::Heading {
        level,
        text: text.to_string(),
        runs: split_runs(text),
    }
}

/// Inner text of a line that is wrapped exactly once in `**`.
fn whole_line_bold(trimmed: &str) -> Option<&str> {
    let inner = trimmed.strip_prefix("**")?.strip_suffix("**")?;
    if inner.contains("**") || inner.trim().is_empty() {
        return None;
    }
    Some(inner.trim())
}

fn formula_payload(trimmed: &str) -> Option<&str> {
    let body = trimmed.strip_prefix(FORMULA_PREFIX)?.strip_suffix(']')?;
    Some(body.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::{ColorTag, StyledRun};
    use proptest::prelude::*;

    fn paragraph(text: &str) -> Block {
        Block::Paragraph {
            runs: vec![StyledRun::plain(text)],
        }
    }

    #[test]
    fn test_parse_empty_note() {
        assert!(parse("").is_empty());
        assert!(parse("\n  \n\t\n").is_empty());
    }

    #[test]
    fn test_plain_line_round_trips() {
        let line = "  The mitochondria is the powerhouse of the cell.";
        assert_eq!(parse(line), vec![paragraph(line)]);
    }

    #[test]
    fn test_rule_line() {
        assert_eq!(parse("---"), vec![Block::Rule]);
        assert_eq!(parse("  ---  "), vec![Block::Rule]);
        assert_eq!(parse("----"), vec![paragraph("----")]);
    }

    #[test]
    fn test_title_line_is_heading_level_one() {
        let blocks = parse("**My Title**");
        assert_eq!(
            blocks,
            vec![Block::Heading {
                level: 1,
                text: "My Title".to_string(),
                runs: vec![StyledRun::plain("My Title")],
            }]
        );
    }

    #[test]
    fn test_inline_bold_is_not_title() {
        let blocks = parse("This is **My Title** inline.");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                runs: vec![
                    StyledRun::plain("This is "),
                    StyledRun::bold("My Title"),
                    StyledRun::plain(" inline."),
                ],
            }]
        );
    }

    #[test]
    fn test_two_bold_spans_on_one_line_are_not_title() {
        let blocks = parse("**A** and **B**");
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
        assert_eq!(blocks[0].plain_text(), "A and B");
    }

    #[test]
    fn test_heading_levels() {
        let blocks = parse("# One\n## Two\n### Three");
        let levels: Vec<u8> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { level, .. } => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn test_section_heading_text_is_remainder() {
        let blocks = parse("## Key Concepts");
        assert!(matches!(
            &blocks[0],
            Block::Heading { level: 2, text, .. } if text == "Key Concepts"
        ));
    }

    #[test]
    fn test_heading_runs_keep_color_spans() {
        let blocks = parse("## <span style=\"color: #059669\">Terms</span>");
        let Block::Heading { runs, .. } = &blocks[0] else {
            panic!("expected heading");
        };
        assert_eq!(runs[0].color, ColorTag::Definition);
    }

    #[test]
    fn test_bullets_are_one_block_per_line() {
        let blocks = parse("* one\n* two\n* three");
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(Block::is_bullet));
        assert_eq!(blocks[2].plain_text(), "three");
    }

    #[test]
    fn test_blank_line_between_bullets_yields_two_blocks() {
        let blocks = parse("* one\n\n* two");
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(Block::is_bullet));
    }

    #[test]
    fn test_dash_and_dot_bullets() {
        let blocks = parse("- dash\n• dot");
        assert!(blocks.iter().all(Block::is_bullet));
    }

    #[test]
    fn test_formula_boundary() {
        assert_eq!(
            parse("[FORMULA: E = mc^2]"),
            vec![Block::Formula {
                text: "E = mc^2".to_string()
            }]
        );
        assert_eq!(
            parse("[FORMULA: incomplete"),
            vec![paragraph("[FORMULA: incomplete")]
        );
    }

    #[test]
    fn test_color_span_in_paragraph() {
        let blocks =
            parse("Read this: <span style=\"color: #dc2626; font-weight: bold;\">Warning</span>");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                runs: vec![
                    StyledRun::plain("Read this: "),
                    StyledRun::bold("Warning").with_color(ColorTag::Critical),
                ],
            }]
        );
    }

    #[test]
    fn test_mermaid_tag_is_extracted_in_order() {
        let blocks = parse("Before\n<mermaid>\ngraph TD;\nA-->B;\n</mermaid>\nAfter");
        assert_eq!(
            blocks,
            vec![
                paragraph("Before"),
                Block::Diagram {
                    source: "graph TD;\nA-->B;".to_string()
                },
                paragraph("After"),
            ]
        );
    }

    #[test]
    fn test_uppercase_mermaid_tag() {
        let blocks = parse("<MERMAID>graph LR; A-->B</MERMAID>");
        assert_eq!(
            blocks,
            vec![Block::Diagram {
                source: "graph LR; A-->B".to_string()
            }]
        );
    }

    #[test]
    fn test_mixed_case_tags_do_not_close_each_other() {
        let blocks = parse("<mermaid>graph TD</MERMAID>");
        assert_eq!(blocks, vec![paragraph("<mermaid>graph TD</MERMAID>")]);
    }

    #[test]
    fn test_fenced_mermaid_block() {
        let blocks = parse("Intro\n```mermaid\ngraph LR;\nA --> B;\n```\nOutro");
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[1],
            Block::Diagram {
                source: "graph LR;\nA --> B;".to_string()
            }
        );
    }

    #[test]
    fn test_diagram_match_is_non_greedy() {
        let blocks = parse("<mermaid>a</mermaid> mid <mermaid>b</mermaid>");
        assert_eq!(
            blocks,
            vec![
                Block::Diagram {
                    source: "a".to_string()
                },
                paragraph(" mid "),
                Block::Diagram {
                    source: "b".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_unterminated_diagram_is_text() {
        let blocks = parse("<mermaid>\ngraph TD;");
        assert_eq!(blocks, vec![paragraph("<mermaid>"), paragraph("graph TD;")]);
    }

    #[test]
    fn test_unterminated_fence_is_text() {
        let blocks = parse("```mermaid\ngraph TD;");
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| matches!(b, Block::Paragraph { .. })));
    }

    #[test]
    fn test_crlf_line_endings() {
        let blocks = parse("## Title\r\n* item\r\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].plain_text(), "item");
    }

    #[test]
    fn test_full_study_note() {
        let note = "**Linear Equations**\n\n---\n\n## Key Concepts\n\n- <span style=\"color: #059669; font-weight: bold;\">Linear equation</span>: a straight line\n\n```mermaid\ngraph LR;\nA --> B;\n```\n\n[FORMULA: y = mx + b]";
        let blocks = parse(note);
        assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
        assert_eq!(blocks[1], Block::Rule);
        assert!(matches!(blocks[2], Block::Heading { level: 2, .. }));
        assert!(blocks[3].is_bullet());
        assert!(matches!(blocks[4], Block::Diagram { .. }));
        assert!(matches!(blocks[5], Block::Formula { .. }));
    }

    proptest! {
        #[test]
        fn prop_parse_is_idempotent(input in "(?s).{0,200}") {
            prop_assert_eq!(parse(&input), parse(&input));
        }

        #[test]
        fn prop_markup_fragments_never_panic(
            parts in proptest::collection::vec(
                prop_oneof![
                    Just("**"), Just("<span style=\"color: #dc2626\">"), Just("</span>"),
                    Just("<mermaid>"), Just("</mermaid>"), Just("```mermaid\n"), Just("```"),
                    Just("[FORMULA:"), Just("]"), Just("\n"), Just("* "), Just("## "),
                    Just("---"), Just("text"), Just("é"),
                ],
                0..30,
            )
        ) {
            let input: String = parts.concat();
            let _ = parse(&input);
        }

        #[test]
        fn prop_plain_lines_round_trip(line in "[a-zA-Z0-9 ,.]{1,60}") {
            prop_assume!(!line.trim().is_empty());
            let trimmed = line.trim();
            prop_assume!(trimmed != "---");
            let blocks = parse(&line);
            prop_assert_eq!(blocks, vec![paragraph(&line)]);
        }
    }
}
